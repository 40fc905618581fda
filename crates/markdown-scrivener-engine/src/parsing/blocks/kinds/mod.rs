pub mod heading;
pub mod list_item;
pub mod paragraph;
pub mod rule;

pub use heading::Heading;
pub use list_item::{OrderedItem, UnorderedItem};
pub use paragraph::Paragraph;
pub use rule::Rule;
