use crate::errors::SharedError;

/// A sink for the values of a stream followed by at most one terminal signal.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: SharedError);
}
