use std::fmt;

const MASK: &str = "********";

/// A credential that must never end up in logs.
///
/// `Debug` and `Display` print a fixed mask, so a `Secret` can sit inside a configuration struct that
/// derives `Debug` without leaking. Access to the wrapped value is explicit, via [`Secret::reveal`].
#[derive(Clone)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formatting_never_prints_the_value() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret:?}"), MASK);
        assert_eq!(format!("{secret}"), MASK);
        assert_eq!(secret.reveal(), "hunter2");
    }
}
