//! On Windows, the styling provided by colored::Colorize does not render as expected in all
//! consoles. The NoBold trait provides do-nothing replacements for the styles pinman uses.

pub trait NoBold {
    fn bold(self) -> String;
    fn green(self) -> String;
}

impl NoBold for &str {
    fn bold(self) -> String {
        self.to_string()
    }
    fn green(self) -> String {
        self.to_string()
    }
}
impl NoBold for String {
    fn bold(self) -> String {
        self
    }
    fn green(self) -> String {
        self
    }
}
