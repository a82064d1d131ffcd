//! Conversion between textual grade labels and numeric difficulty.
//!
//! Labels follow the V-scale convention (`"V0"`, `"V7"`, ...). Anything that
//! does not match decodes to `0`, which makes an unparsable label
//! indistinguishable from a genuine `"V0"` send in every downstream sum,
//! average and threshold. That precision loss is kept for compatibility
//! with existing corpora.

/// Stateless helper for grade label conversion.
pub struct GradeCodec;

impl GradeCodec {
    /// Numeric difficulty of `label`.
    ///
    /// Returns the integer after a leading `V` when it parses as a base-10
    /// integer (optional sign, surrounding whitespace ignored), otherwise
    /// `0`. Never fails.
    pub fn decode(label: &str) -> i32 {
        label
            .strip_prefix('V')
            .and_then(|rest| rest.trim().parse::<i32>().ok())
            .unwrap_or(0)
    }

    /// Decode every label in order.
    pub fn decode_all<S: AsRef<str>>(labels: &[S]) -> Vec<i32> {
        labels.iter().map(|l| Self::decode(l.as_ref())).collect()
    }

    /// Display label for a numeric grade, e.g. `7` → `"V7"`.
    pub fn encode(value: i32) -> String {
        format!("V{}", value)
    }
}
