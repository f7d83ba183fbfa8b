//! # bookshelf
//!
//! Integration adapters ("books") exposing external providers through a
//! uniform procedure-call interface.
//!
//! ## Books
//!
//! - **OpenWeather** (`openweather`): real-time temperature lookup for any city
//! - **Twilio** (`twilio`): send and read SMS messages, with filter-expression
//!   support over sender, recipient and sent date
//! - **YAML** (`yaml`): in-memory YAML document editing, file and text I/O
//!
//! Each book implements the [`Book`] trait and registers on a [`Bookshelf`]
//! for dispatch by name; read-style procedures accept a [`FilterExpr`] plus
//! offset/limit pagination.
//!
//! ## Library usage
//!
//! ```no_run
//! use bookshelf::{Bookshelf, Book, ConnectInput, ProcedureInput};
//! use bookshelf::openweather::OpenWeatherBook;
//!
//! let mut shelf = Bookshelf::new();
//! shelf.register(Box::new(OpenWeatherBook::new()));
//! shelf
//!     .connect("openweather", ConnectInput::new().with_param("api_key", "k"))
//!     .unwrap();
//! let out = shelf
//!     .call(
//!         "openweather",
//!         "current_temperature",
//!         ProcedureInput::new().with_text("city", "London"),
//!     )
//!     .unwrap();
//! println!("{:?}", out.as_number());
//! ```

pub mod book;
pub mod error;
pub mod filter;
pub mod openweather;
pub mod phrase;
pub mod twilio;
pub mod value;
pub mod yaml;

pub use book::{
    Book, BookSignature, Bookshelf, Concept, ConnectInput, ProcedureInput, ProcedureParam,
    ProcedureSignature, paginate,
};
pub use error::{
    BookError, BookResult, ConfigError, DocumentError, FilterError, ProviderError,
};
pub use filter::{BinaryOperator, FilterExpr, FilterVisitor, UnaryOperator};
pub use phrase::NounPhrase;
pub use value::Value;
