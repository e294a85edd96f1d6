//! Bus name parsing.
//!
//! Digital buses are addressed with a base name and an index range, such as
//! `DOUT<7:0>`. Angle brackets are preferred; square brackets are accepted
//! for compatibility with netlists that use them.

use std::fmt::Display;

use arcstr::ArcStr;
use itertools::Either;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The index range of a (possibly single-bit) bus name.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BusRange {
    base: ArcStr,
    start: usize,
    stop: usize,
    bracketed: bool,
}

fn malformed(name: &str, reason: &str) -> Error {
    Error::Configuration(format!("malformed bus name `{name}`: {reason}"))
}

fn parse_index(name: &str, s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed(name, "bus indices must be unsigned integers"));
    }
    s.parse()
        .map_err(|_| malformed(name, "bus index out of range"))
}

impl BusRange {
    /// Parses a bus name.
    ///
    /// Accepts `name`, `name<n>`, `name<hi:lo>`, `name[n]` and `name[hi:lo]`.
    /// Any other use of bracket or colon characters is rejected rather than
    /// guessed at.
    ///
    /// ```
    /// use spice::BusRange;
    ///
    /// let bus = BusRange::parse("DOUT<3:0>").unwrap();
    /// assert_eq!(bus.width(), 4);
    /// assert_eq!(bus.indices().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    /// assert!(BusRange::parse("DOUT<3:>").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        let open = name.find(['<', '[']);
        let Some(open) = open else {
            if name.is_empty() {
                return Err(malformed(name, "empty name"));
            }
            if name.contains([':', '>', ']']) {
                return Err(malformed(name, "unbalanced brackets"));
            }
            return Ok(Self {
                base: ArcStr::from(name),
                start: 0,
                stop: 0,
                bracketed: false,
            });
        };

        let base = &name[..open];
        if base.is_empty() {
            return Err(malformed(name, "missing base name"));
        }
        let close = match &name[open..open + 1] {
            "<" => '>',
            _ => ']',
        };
        if !name.ends_with(close) {
            return Err(malformed(name, "bus range must close at the end of the name"));
        }
        let inner = &name[open + 1..name.len() - 1];
        if inner.contains(['<', '>', '[', ']']) {
            return Err(malformed(name, "nested brackets"));
        }

        let (start, stop) = match inner.split_once(':') {
            Some((hi, lo)) => {
                if lo.contains(':') {
                    return Err(malformed(name, "too many indices"));
                }
                (parse_index(name, hi)?, parse_index(name, lo)?)
            }
            None => {
                let idx = parse_index(name, inner)?;
                (idx, idx)
            }
        };

        Ok(Self {
            base: ArcStr::from(base),
            start,
            stop,
            bracketed: true,
        })
    }

    /// The name without its index range.
    #[inline]
    pub fn base(&self) -> &ArcStr {
        &self.base
    }

    /// The first declared index.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The last declared index.
    #[inline]
    pub fn stop(&self) -> usize {
        self.stop
    }

    /// Whether the name carried an explicit index range.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.bracketed
    }

    /// The number of bits addressed by this name.
    pub fn width(&self) -> usize {
        self.start.abs_diff(self.stop) + 1
    }

    /// The smallest index in the range.
    pub fn low(&self) -> usize {
        self.start.min(self.stop)
    }

    /// The largest index in the range.
    pub fn high(&self) -> usize {
        self.start.max(self.stop)
    }

    /// Iterates over indices in declaration order, from `start` to `stop`.
    pub fn indices(&self) -> impl Iterator<Item = usize> + Clone {
        if self.start >= self.stop {
            Either::Left((self.stop..=self.start).rev())
        } else {
            Either::Right(self.start..=self.stop)
        }
    }

    /// The name of the bit at `index`.
    ///
    /// Names without an index range have a single bit named after the base.
    pub fn bit_name(&self, index: usize) -> String {
        if self.bracketed {
            format!("{}<{}>", self.base, index)
        } else {
            self.base.to_string()
        }
    }

    /// Bit names in declaration order.
    pub fn bit_names(&self) -> Vec<String> {
        self.indices().map(|i| self.bit_name(i)).collect()
    }
}

impl Display for BusRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.bracketed {
            write!(f, "{}", self.base)
        } else if self.start == self.stop {
            write!(f, "{}<{}>", self.base, self.start)
        } else {
            write!(f, "{}<{}:{}>", self.base, self.start, self.stop)
        }
    }
}
