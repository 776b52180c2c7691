//! # 阶段 1：行归类与拼接
//!
//! 把物理行重组为逻辑行。`^…^` 字符串常量可以跨越换行，
//! 因此一条命令可能分布在多条物理行上；本阶段按未配对的
//! `^` 计数识别这种情况，并把碎片拼回一条逻辑行。

/// 逻辑行缓冲上限。超过即丢弃该逻辑行并上报超长
pub const MAX_LOGICAL_LINE: usize = 1024 * 1024;

/// 物理行归类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// 以 `!` 开头且 `^` 计数为偶，完整命令行
    CommandFull,
    /// 不以 `!` 开头且当前不在字符串内，注释行
    Comment,
    /// 字符串在本行开始或延续，尚未闭合
    UnfinishedString,
    /// 本行闭合了跨行字符串
    EndOfString,
}

/// 统计首个 `;` 之前未配对的 `^` 个数
///
/// 从左到右扫描，遇 `;` 即停，计数内不识别任何转义。
pub fn count_hats_before_semicolon(line: &str) -> usize {
    let mut hats = 0;
    for c in line.chars() {
        if c == ';' {
            break;
        }
        if c == '^' {
            hats += 1;
        }
    }
    hats
}

/// 归类一条物理行
///
/// 纯函数，结果只取决于 `(line, in_string)`。
pub fn classify_line(line: &str, in_string: bool) -> LineKind {
    let odd_hats = count_hats_before_semicolon(line) % 2 == 1;
    if line.starts_with('!') {
        if odd_hats {
            LineKind::UnfinishedString
        } else {
            LineKind::CommandFull
        }
    } else if in_string {
        if odd_hats {
            LineKind::EndOfString
        } else {
            LineKind::UnfinishedString
        }
    } else {
        LineKind::Comment
    }
}

/// 一条完整的逻辑行
///
/// `line_number` 指逻辑行起始的那条物理行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub line_number: usize,
    pub text: String,
}

/// 喂入一条物理行后的产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// 逻辑行尚未完整
    Pending,
    /// 产出一条完整的逻辑行
    Line(LogicalLine),
    /// 逻辑行缓冲超限，该逻辑行被丢弃
    Overflow { line_number: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InsideString,
}

/// 行拼接状态机
///
/// 两个状态：`Outside`（初始）和 `InsideString`。状态与缓冲
/// 只存活于单次文件解析内，跨行保持、跨文件不共享。
#[derive(Debug)]
pub struct LineAssembler {
    state: State,
    buffer: String,
    start_line: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Outside,
            buffer: String::new(),
            start_line: 0,
        }
    }

    /// 当前是否在跨行字符串内
    pub fn in_string(&self) -> bool {
        self.state == State::InsideString
    }

    /// 喂入一条物理行
    pub fn feed(&mut self, line_number: usize, line: &str) -> Feed {
        let kind = classify_line(line, self.in_string());
        match self.state {
            State::Outside => match kind {
                // EndOfString 在 Outside 不可达，若出现按完整命令处理
                LineKind::CommandFull | LineKind::Comment | LineKind::EndOfString => {
                    Feed::Line(LogicalLine {
                        line_number,
                        text: line.to_string(),
                    })
                }
                LineKind::UnfinishedString => {
                    self.buffer.clear();
                    self.buffer.push_str(line);
                    self.start_line = line_number;
                    self.state = State::InsideString;
                    Feed::Pending
                }
            },
            State::InsideString => {
                if self.buffer.len() + 1 + line.len() > MAX_LOGICAL_LINE {
                    let start_line = self.start_line;
                    self.reset();
                    return Feed::Overflow {
                        line_number: start_line,
                    };
                }
                // 跨行字符串保留换行
                self.buffer.push('\n');
                self.buffer.push_str(line);
                match kind {
                    LineKind::EndOfString => {
                        let text = std::mem::take(&mut self.buffer);
                        let line_number = self.start_line;
                        self.state = State::Outside;
                        Feed::Line(LogicalLine { line_number, text })
                    }
                    // 字符串内出现的 CommandFull 一律视为续行
                    _ => Feed::Pending,
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Outside;
        self.buffer.clear();
        self.start_line = 0;
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
