//! A parser library for Paradox script text, as found in melted EU5 saves.
//!
//! The format is nested `key=value` assignments and `{ ... }` blocks. Save
//! files are tens of megabytes, so this crate offers two layers:
//!
//! * [`locate`] streams a file line by line and cuts out the text of one
//!   record (a country, a character, a named section) by tracking brace
//!   depth, without parsing anything else;
//! * [`parser`] turns that text into a [`Value`] tree, and [`extract`]
//!   pulls single fields out of it when building a whole tree is overkill.
//!
//! ```
//! use eu5txt::{Locator, marker};
//!
//! let save = "countries={\n\tdatabase={\n\t\t100={\n\t\t\tcountry_name=\"BRI\"\n\t\t}\n\t\t200={\n\t\t\tcountry_name=\"FRA\"\n\t\t\tgold=10.5\n\t\t}\n\t}\n}\n";
//! let found = Locator::new()
//!     .within(["countries", "database"])
//!     .find_record_by_marker(save.as_bytes(), marker::quoted_field("country_name", "FRA"))
//!     .unwrap()
//!     .unwrap();
//! let record = found.parse_body().unwrap().unwrap();
//! assert_eq!(record.get("gold").and_then(|v| v.as_f64()), Some(10.5));
//! ```

pub mod de;
pub mod error;
pub mod extract;
pub mod locate;
pub mod marker;
pub mod parser;
pub mod scan;
pub mod ser;
pub mod source;
pub mod value;

pub use de::{from_mapping, from_value};
pub use error::{Error, ParseError};
pub use locate::{
    LocateOptions, LocatedBlock, Locator, find_record_by_marker, find_section_by_declaration,
};
pub use parser::{Parser, parse, parse_block, parse_value};
pub use ser::to_script_string;
pub use source::{SourceOptions, open_source};
pub use value::{Mapping, Value};
