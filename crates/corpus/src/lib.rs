//! # Thai Food Corpus
//!
//! The immutable record set that semantic search runs over.
//!
//! ```text
//! RawRow[] (named fields, source order)
//!     │
//!     ├──> SearchTextPolicy (ordered field list + separator)
//!     │      └─> Record.search_text
//!     │
//!     └──> Corpus
//!            ├─> RecordId = row index
//!            └─> CorpusVersion = SHA-256 of content
//! ```
//!
//! ## Example
//!
//! ```
//! use thaifood_corpus::{Corpus, RawRow, RecordId, SearchTextPolicy};
//!
//! let rows = vec![
//!     RawRow::new().with_field("name", "ต้มยำกุ้ง").with_field("ingredients", "กุ้ง ข่า ตะไคร้"),
//!     RawRow::new().with_field("name", "ผัดกะเพราหมู").with_field("ingredients", "หมู ใบกะเพรา"),
//! ];
//! let policy = SearchTextPolicy::new(["name", "ingredients"]).unwrap();
//! let corpus = Corpus::load(rows, &policy).unwrap();
//!
//! assert_eq!(corpus.len(), 2);
//! assert_eq!(corpus.get(RecordId(0)).unwrap().search_text, "ต้มยำกุ้ง กุ้ง ข่า ตะไคร้");
//! ```

mod corpus;
mod error;
mod policy;
mod types;

pub use corpus::{Corpus, CorpusVersion};
pub use error::{CorpusError, Result};
pub use policy::{
    SearchTextPolicy, CATEGORY_FIELD, CRAVING_QUERY_FIELD, DEFAULT_SEPARATOR, DISH_NAME_FIELD,
    INGREDIENTS_FIELD,
};
pub use types::{RawRow, Record, RecordId};
