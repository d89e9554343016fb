mod tsx;

pub use tsx::{parse_tsx, source_type_for};
