use crate::utils::error::{Result, SiteError};
use std::io::{BufRead, Write};

/// 要求使用者輸入 yes 才繼續，其餘輸入一律視為取消
pub fn confirm<R: BufRead, W: Write>(mut input: R, mut output: W, question: &str) -> Result<()> {
    write!(output, "{} (yes/no): ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    if answer.trim().eq_ignore_ascii_case("yes") {
        Ok(())
    } else {
        Err(SiteError::Cancelled)
    }
}

pub fn confirm_stdin(question: &str) -> Result<()> {
    let stdin = std::io::stdin();
    confirm(stdin.lock(), std::io::stdout(), question)
}
