//! Top-level declarations

use super::expr::Expr;
use super::location::Location;
use super::node::AstNode;
use super::scope::LocalScope;
use std::fmt;

/// A named parameter with an optional default value
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{} = {}", self.name, default),
            None => write!(f, "{}", self.name),
        }
    }
}

fn print_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", param)?;
    }
    Ok(())
}

/// `name = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
    pub location: Location,
}

impl AstNode for Assignment {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{}{} = {};", indent, self.name, self.value)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

/// `function name(params) = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Expr,
    pub location: Location,
}

impl AstNode for FunctionDecl {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        write!(f, "{}function {}(", indent, self.name)?;
        print_params(f, &self.params)?;
        writeln!(f, ") = {};", self.body)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

/// `module name(params) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: LocalScope,
    pub location: Location,
}

impl AstNode for ModuleDecl {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        write!(f, "{}module {}(", indent, self.name)?;
        print_params(f, &self.params)?;
        writeln!(f, ") {{")?;
        let inner = format!("{}\t", indent);
        self.body.print(f, &inner)?;
        writeln!(f, "{}}}", indent)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

/// `name(args);` - a module instantiation statement
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInstantiation {
    pub name: String,
    pub args: Vec<Expr>,
    pub location: Location,
}

impl AstNode for ModuleInstantiation {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        write!(f, "{}{}(", indent, self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        writeln!(f, ");")
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

/// One entry of a [`LocalScope`]
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Assignment(Assignment),
    Function(FunctionDecl),
    Module(ModuleDecl),
    Instantiation(ModuleInstantiation),
    /// Placeholder marking where an `include` statement appeared; replaced
    /// in place by the included file's declarations when externals are
    /// resolved. The index refers to the owning module's external list.
    Include(usize),
}

impl Declaration {
    /// The declared name, if this entry binds one
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Assignment(a) => Some(&a.name),
            Declaration::Function(func) => Some(&func.name),
            Declaration::Module(m) => Some(&m.name),
            Declaration::Instantiation(_) | Declaration::Include(_) => None,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Declaration::Assignment(a) => a.location,
            Declaration::Function(func) => func.location,
            Declaration::Module(m) => m.location,
            Declaration::Instantiation(inst) => inst.location,
            Declaration::Include(_) => Location::NONE,
        }
    }

    pub(crate) fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        match self {
            Declaration::Assignment(a) => a.print(f, indent),
            Declaration::Function(func) => func.print(f, indent),
            Declaration::Module(m) => m.print(f, indent),
            Declaration::Instantiation(inst) => inst.print(f, indent),
            Declaration::Include(_) => writeln!(f, "{}<unresolved include>", indent),
        }
    }
}
