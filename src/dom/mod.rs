pub mod markup;

pub use markup::Markup;
