//! # 物理行读取
//!
//! 从任意 `BufRead` 按行读取脚本源文本，物理行长度有上限。

use std::io::{self, BufRead};

/// 物理行长度上限，含行终止符
pub const MAX_PHYSICAL_LINE: usize = 1024;

/// 一条物理行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalLine {
    /// 行内容，行终止符已去除
    pub text: String,
    /// 是否因超长被截断
    pub truncated: bool,
}

/// 物理行读取器
///
/// 行终止符接受 LF 和 CRLF，归类之前去掉行尾的 CR。
/// 超过上限仍未见换行的行被截断产出，剩余字节延续为
/// 后续物理行，各自占用自己的行号。
pub struct SourceReader<R> {
    inner: R,
}

impl<R: BufRead> SourceReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// 读取下一条物理行，文件结束时返回 `None`
    pub fn read_physical_line(&mut self) -> io::Result<Option<PhysicalLine>> {
        let mut raw: Vec<u8> = Vec::new();
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                if raw.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(finish(raw, false)));
            }

            let room = MAX_PHYSICAL_LINE - 1 - raw.len();
            let window = &available[..available.len().min(room)];
            match window.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    raw.extend_from_slice(&window[..newline]);
                    self.inner.consume(newline + 1);
                    return Ok(Some(finish(raw, false)));
                }
                None => {
                    let taken = window.len();
                    raw.extend_from_slice(window);
                    self.inner.consume(taken);
                    if raw.len() >= MAX_PHYSICAL_LINE - 1 {
                        return Ok(Some(finish(raw, true)));
                    }
                }
            }
        }
    }
}

fn finish(mut raw: Vec<u8>, truncated: bool) -> PhysicalLine {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    // 源文件名义上是 7-bit ASCII，异常字节宽松替换而不中止
    PhysicalLine {
        text: String::from_utf8_lossy(&raw).into_owned(),
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &[u8]) -> Vec<PhysicalLine> {
        let mut reader = SourceReader::new(Cursor::new(input.to_vec()));
        let mut lines = Vec::new();
        while let Some(line) = reader.read_physical_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_read_lf_lines() {
        let lines = read_all(b"ZVSE\n!?FU;\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "ZVSE");
        assert_eq!(lines[1].text, "!?FU;");
        assert!(!lines[0].truncated);
    }

    #[test]
    fn test_read_crlf_lines() {
        let lines = read_all(b"ZVSE\r\n!?FU;\r\n");
        assert_eq!(lines[0].text, "ZVSE");
        assert_eq!(lines[1].text, "!?FU;");
    }

    #[test]
    fn test_last_line_without_terminator() {
        let lines = read_all(b"ZVSE\n!?FU;");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "!?FU;");
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all(b"").is_empty());
    }

    #[test]
    fn test_overlong_line_is_truncated_and_continues() {
        let mut input = vec![b'a'; 2000];
        input.push(b'\n');
        input.extend_from_slice(b"tail\n");

        let lines = read_all(&input);
        // 2000 字节拆成 1023 + 977，随后才是 tail
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text.len(), MAX_PHYSICAL_LINE - 1);
        assert!(lines[0].truncated);
        assert_eq!(lines[1].text.len(), 2000 - (MAX_PHYSICAL_LINE - 1));
        assert!(!lines[1].truncated);
        assert_eq!(lines[2].text, "tail");
    }
}
