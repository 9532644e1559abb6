mod renderer;
mod shared;

pub use renderer::Renderer;
