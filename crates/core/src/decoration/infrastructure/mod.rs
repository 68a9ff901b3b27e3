pub mod decoration_loader;
