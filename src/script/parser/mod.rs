//! # Parser 模块
//!
//! 两阶段 ERM 脚本解析器实现（手写递归下降，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 字节流 → [物理行读取] → [阶段1: 行归类与拼接] → 逻辑行 → [阶段2: 行文法] → Line AST
//! ```
//!
//! ## 设计原则
//!
//! - 使用手写的字符解析函数，避免正则表达式
//! - 行号追踪：逻辑行携带其起始物理行的行号
//! - 容错解析：单行失败经由诊断接收器上报后跳过，文件解析继续
//!
//! ## 模块结构
//!
//! - `source`: 物理行读取
//! - `phase1`: 行归类与拼接
//! - `phase2`: 行文法

mod phase1;
mod phase2;
mod source;


use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::script::ast::{Command, Line};

pub use phase1::{
    Feed, LineAssembler, LineKind, LogicalLine, MAX_LOGICAL_LINE, classify_line,
    count_hats_before_semicolon,
};
pub use phase2::parse_line;
pub use source::{MAX_PHYSICAL_LINE, PhysicalLine, SourceReader};

/// 解析完成的脚本
///
/// 保留的行 AST 及其起始物理行号（source map）。空行不保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 脚本文件路径
    pub path: String,
    /// 解析出的行列表
    pub lines: Vec<Line>,
    /// 每条行对应的起始物理行号
    source_map: Vec<usize>,
}

impl Script {
    /// 创建空脚本
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
            source_map: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, line: Line, source_line: usize) {
        self.lines.push(line);
        self.source_map.push(source_line);
    }

    /// 行数量
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 获取指定索引的行
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// 指定索引的行始于哪条物理行
    pub fn source_line(&self, index: usize) -> Option<usize> {
        self.source_map.get(index).copied()
    }

    /// 遍历其中的命令行
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.lines.iter().filter_map(Line::as_command)
    }
}

/// ERM 脚本解析器
///
/// 持有脚本路径；[`ErmParser::parse_file`] 才打开文件。
/// 所有错误经由注入的诊断接收器上报，调用方视角下不失败。
pub struct ErmParser {
    src_file: PathBuf,
}

impl ErmParser {
    /// 创建解析器，只记录路径，不打开文件
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            src_file: path.into(),
        }
    }

    /// 脚本文件路径
    pub fn path(&self) -> &Path {
        &self.src_file
    }

    /// 解析整个脚本文件
    ///
    /// 打开文件、校验 ZVSE 文件头、驱动行拼接与行文法，
    /// 返回解析出的 AST 流。文件头是第 1 行，其后的物理行
    /// 从第 2 行起计数。
    ///
    /// # 错误
    ///
    /// 本函数不失败：打开失败与文件头错误中止解析，
    /// 超长行与单行文法失败上报后继续，全部走诊断接收器。
    pub fn parse_file(&self, sink: &mut dyn DiagnosticSink) -> Script {
        let mut script = Script::new(self.src_file.display().to_string());

        let file = match File::open(&self.src_file) {
            Ok(file) => file,
            Err(io_error) => {
                error!(path = %self.src_file.display(), error = %io_error, "无法打开脚本文件");
                sink.report(Diagnostic::file_open_failed(&self.src_file));
                return script;
            }
        };
        let mut reader = SourceReader::new(BufReader::new(file));

        // 第 1 行必须恰好是 ZVSE 文件头
        match reader.read_physical_line() {
            Ok(Some(header)) if header.text == "ZVSE" => {}
            _ => {
                sink.report(Diagnostic::bad_header(&self.src_file));
                return script;
            }
        }

        info!(path = %self.src_file.display(), "开始解析 ERM 脚本");

        let mut assembler = LineAssembler::new();
        let mut line_number = 1usize;
        loop {
            line_number += 1;
            let physical = match reader.read_physical_line() {
                Ok(Some(physical)) => physical,
                Ok(None) => break,
                Err(io_error) => {
                    // 读取中途的 IO 错误结束整个读取循环
                    error!(path = %self.src_file.display(), error = %io_error, "读取脚本文件失败");
                    break;
                }
            };
            if physical.truncated {
                sink.report(Diagnostic::line_too_long(&self.src_file, line_number));
            }
            match assembler.feed(line_number, &physical.text) {
                Feed::Pending => {}
                Feed::Overflow { line_number } => {
                    sink.report(Diagnostic::line_too_long(&self.src_file, line_number));
                }
                Feed::Line(logical) => self.accept_line(logical, &mut script, sink),
            }
        }
        // 文件结束时仍未闭合的跨行字符串随缓冲一起丢弃

        info!(path = %self.src_file.display(), line_count = script.len(), "脚本解析完成");
        script
    }

    fn accept_line(&self, logical: LogicalLine, script: &mut Script, sink: &mut dyn DiagnosticSink) {
        match parse_line(&logical.text) {
            Ok(Line::Empty) => {}
            Ok(line) => script.push(line, logical.line_number),
            Err(parse_error) => {
                warn!(line = logical.line_number, error = %parse_error, "脚本行解析失败");
                sink.report(Diagnostic::parse_failed(
                    logical.line_number,
                    &logical.text,
                    &parse_error,
                ));
            }
        }
    }
}
