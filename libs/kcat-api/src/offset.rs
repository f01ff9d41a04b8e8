use std::fmt;
use std::str::FromStr;

/// Where consumption of a partition starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartOffset {
    #[default]
    Beginning,
    End,
    /// Resume from the client's stored offset.
    Stored,
    Absolute(i64),
    /// `n` messages before the end of the partition.
    Tail(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid offset '{0}': expected beginning, end, stored, <n> or -<n>")]
pub struct InvalidOffset(pub String);

impl FromStr for StartOffset {
    type Err = InvalidOffset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginning" => Ok(StartOffset::Beginning),
            "end" => Ok(StartOffset::End),
            "stored" => Ok(StartOffset::Stored),
            _ => {
                let n: i64 = s.parse().map_err(|_| InvalidOffset(s.to_string()))?;
                if n >= 0 {
                    return Ok(StartOffset::Absolute(n));
                }
                n.checked_neg()
                    .map(StartOffset::Tail)
                    .ok_or_else(|| InvalidOffset(s.to_string()))
            }
        }
    }
}

impl fmt::Display for StartOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOffset::Beginning => f.write_str("beginning"),
            StartOffset::End => f.write_str("end"),
            StartOffset::Stored => f.write_str("stored"),
            StartOffset::Absolute(n) => write!(f, "{n}"),
            StartOffset::Tail(n) => write!(f, "-{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_offsets() {
        assert_eq!("beginning".parse::<StartOffset>(), Ok(StartOffset::Beginning));
        assert_eq!("end".parse::<StartOffset>(), Ok(StartOffset::End));
        assert_eq!("stored".parse::<StartOffset>(), Ok(StartOffset::Stored));
    }

    #[test]
    fn negative_offset_counts_from_end() {
        assert_eq!("42".parse::<StartOffset>(), Ok(StartOffset::Absolute(42)));
        assert_eq!("-10".parse::<StartOffset>(), Ok(StartOffset::Tail(10)));
        assert_eq!("0".parse::<StartOffset>(), Ok(StartOffset::Absolute(0)));
    }

    #[test]
    fn rejects_garbage() {
        let err = "latest".parse::<StartOffset>().unwrap_err();
        assert_eq!(err, InvalidOffset("latest".into()));
    }
}
