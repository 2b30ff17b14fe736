pub mod ngx_parser;

pub use ngx_parser::{NgxParser, Parser};
