//! Syntax node trait

use super::location::Location;
use std::fmt;

/// Base behavior of every parseable construct: a structural print and a
/// mutable source location.
pub trait AstNode {
    /// Print this node structurally, prefixing each line with `indent`.
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result;

    fn location(&self) -> Location;

    fn set_location(&mut self, location: Location);

    /// Render the structural print into a string.
    fn dump(&self, indent: &str) -> String
    where
        Self: Sized,
    {
        Printed(self, indent).to_string()
    }
}

/// Adapter giving any node a `Display` view of its structural print.
pub struct Printed<'a, N: AstNode + ?Sized>(pub &'a N, pub &'a str);

impl<N: AstNode + ?Sized> fmt::Display for Printed<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.print(f, self.1)
    }
}
