use owo_colors::{OwoColorize, Stream};
use std::fmt::{self, Display};

/// Closing line of a subcommand
///
/// Passing verdicts go to stdout, failing ones to stderr. Colours are only applied if the respective stream supports them.
pub enum Verdict<T> {
    Pass(T),
    Fail(T),
}

impl<T> Verdict<T> {
    fn stream(&self) -> Stream {
        match self {
            Self::Pass(..) => Stream::Stdout,
            Self::Fail(..) => Stream::Stderr,
        }
    }
}

impl<T> Display for Verdict<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stream = self.stream();
        match self {
            Self::Pass(message) => write!(
                f,
                "✅ {message} {}",
                "(^///^)".if_supports_color(stream, |text| text.green())
            ),
            Self::Fail(message) => write!(
                f,
                "❌ {message} {}",
                "(┬┬﹏┬┬)".if_supports_color(stream, |text| text.red())
            ),
        }
    }
}
