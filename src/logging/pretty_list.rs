use std::fmt;

/// Formats a slice as a markdown-style list, one entry per line, for
/// multiline log entries.
pub struct PrettyList<'data, T>(pub &'data [T]);

impl<'data, T> fmt::Debug for PrettyList<'data, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\n")?;
        for entry in self.0 {
            if f.alternate() {
                writeln!(f, "- {:#?}", entry)?;
            } else {
                writeln!(f, "- {:?}", entry)?;
            }
        }
        Ok(())
    }
}

impl<'data, T> fmt::Display for PrettyList<'data, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\n")?;
        for entry in self.0 {
            writeln!(f, "- {}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_listed_one_per_line() {
        let entries = ["device local", "host visible"];

        assert_eq!(
            format!("{}", PrettyList(&entries)),
            "\n- device local\n- host visible\n"
        );
        assert_eq!(format!("{:?}", PrettyList(&[1, 2])), "\n- 1\n- 2\n");
    }

    #[test]
    fn empty_lists_are_a_single_newline() {
        let entries: [u32; 0] = [];

        assert_eq!(format!("{}", PrettyList(&entries)), "\n");
    }
}
