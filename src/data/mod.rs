mod resolver;
pub mod template;

pub use resolver::DataResolver;
