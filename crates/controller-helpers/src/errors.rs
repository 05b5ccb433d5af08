//! Aggregation of independent failures.

use std::error::Error;
use std::fmt;

/// Several independent failures reported as one error.
///
/// Every underlying error is kept, so callers can log all of them instead of
/// only the first. Formats like Kubernetes aggregates: a single error prints
/// as itself, several print as `[e1, e2]`.
#[derive(Debug)]
pub struct AggregateError<E> {
    errors: Vec<E>,
}

impl<E> AggregateError<E> {
    /// Wraps `errors`, or returns `None` when there is nothing to report.
    pub fn new(errors: Vec<E>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.errors.as_slice() {
            return write!(f, "{}", single);
        }

        write!(f, "[")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        write!(f, "]")
    }
}

impl<E: Error + 'static> Error for AggregateError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn Error + 'static))
    }
}

/// `Ok(())` when `errors` is empty, otherwise all of them aggregated.
pub fn aggregate<E>(errors: Vec<E>) -> Result<(), AggregateError<E>> {
    match AggregateError::new(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
