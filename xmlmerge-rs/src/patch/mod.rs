//! Patch operations.
//!
//! A diff document is a root element whose element children are operations,
//! applied in document order:
//!
//! ```xml
//! <diff>
//!   <add sel="/root" type="@id">42</add>
//!   <add sel="/root"><child/></add>
//!   <remove sel="/root/old"/>
//!   <replace sel="/root/a/text()">new</replace>
//! </diff>
//! ```

mod apply;
mod operation;

pub use apply::{Applied, Patcher};
pub use operation::{interpret, AddTarget, Fragment, PatchOperation};

/// Tag names for patch operations.
pub const ADD_TAG: &str = "add";
pub const REMOVE_TAG: &str = "remove";
pub const REPLACE_TAG: &str = "replace";

/// Attribute names for patch operations.
pub const SEL_ATTR: &str = "sel";
pub const TYPE_ATTR: &str = "type";

/// Marks an attribute name in the `type` attribute of `add`.
pub const ATTRIBUTE_MARKER: char = '@';
