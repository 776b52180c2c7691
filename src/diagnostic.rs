//! # 诊断模块
//!
//! 解析期错误的上报通道。
//!
//! ## 设计原则
//!
//! - 接收器作为注入的协作者传入解析器，解析核心对测试保持无副作用
//! - 接收器不抛错、尽力而为，单行失败不会中止整个文件
//! - 消息串是稳定接口，测试可对其做精确断言

use std::fmt;
use std::path::Path;

use tracing::{error, warn};

use crate::error::ParseError;

/// 诊断种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// 文件无法打开，解析中止
    FileOpenFailed,
    /// 文件头不是 ZVSE，解析中止
    BadHeader,
    /// 物理行或逻辑行超长，解析继续
    LineTooLong,
    /// 单条逻辑行文法失败，解析继续
    ParseFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileOpenFailed => write!(f, "FILE_OPEN_FAILED"),
            Self::BadHeader => write!(f, "BAD_HEADER"),
            Self::LineTooLong => write!(f, "LINE_TOO_LONG"),
            Self::ParseFailed => write!(f, "PARSE_FAILED"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 诊断种类
    pub kind: DiagnosticKind,
    /// 行号（如果可定位，从 1 开始，文件头是第 1 行）
    pub line: Option<usize>,
    /// 诊断消息（稳定串）
    pub message: String,
    /// 诊断详情（可选，如文法错误的产生式定位）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建诊断
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 文件无法打开
    pub fn file_open_failed(path: &Path) -> Self {
        Self::new(
            DiagnosticKind::FileOpenFailed,
            format!("File {} not found or unable to open", path.display()),
        )
    }

    /// 文件头错误
    pub fn bad_header(path: &Path) -> Self {
        Self::new(
            DiagnosticKind::BadHeader,
            format!("File {} has wrong header", path.display()),
        )
    }

    /// 行超长
    pub fn line_too_long(path: &Path, line: usize) -> Self {
        Self::new(
            DiagnosticKind::LineTooLong,
            format!(
                "Encountered a problem during parsing {} too long line ({})",
                path.display(),
                line
            ),
        )
        .with_line(line)
    }

    /// 逻辑行文法失败。详情携带产生式定位串
    pub fn parse_failed(line: usize, text: &str, parse_error: &ParseError) -> Self {
        Self::new(
            DiagnosticKind::ParseFailed,
            format!(
                "Parse error for line ({}) : {}\n\tCannot parse: {}",
                line, text, parse_error.tail
            ),
        )
        .with_line(line)
        .with_detail(parse_error.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(line) = self.line {
            write!(f, " line {}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断接收器
///
/// 解析器所有错误都经由此处上报，不以异常控制流越过组件边界。
pub trait DiagnosticSink {
    /// 上报一条诊断
    fn report(&mut self, diagnostic: Diagnostic);
}

/// 收集型接收器（测试与批处理用）
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// 创建空收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 诊断数量
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 指定种类的诊断数量
    pub fn kind_count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// 是否出现过指定种类
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.kind_count(kind) > 0
    }

    /// 按种类过滤
    pub fn filter_by_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// 转发到 tracing 的接收器
///
/// 中止类错误按 error 级别输出，逐行错误按 warn 级别输出。
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::FileOpenFailed | DiagnosticKind::BadHeader => {
                error!(diagnostic = %diagnostic, "脚本解析中止");
            }
            DiagnosticKind::LineTooLong | DiagnosticKind::ParseFailed => {
                warn!(diagnostic = %diagnostic, "脚本行问题");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Production;

    #[test]
    fn test_stable_messages() {
        let path = Path::new("/data/s/story.erm");

        assert_eq!(
            Diagnostic::file_open_failed(path).message,
            "File /data/s/story.erm not found or unable to open"
        );
        assert_eq!(
            Diagnostic::bad_header(path).message,
            "File /data/s/story.erm has wrong header"
        );
        assert_eq!(
            Diagnostic::line_too_long(path, 7).message,
            "Encountered a problem during parsing /data/s/story.erm too long line (7)"
        );

        let parse_error = ParseError::new(Production::Trigger, "v1");
        let diag = Diagnostic::parse_failed(2, "!?MAv1", &parse_error);
        assert_eq!(
            diag.message,
            "Parse error for line (2) : !?MAv1\n\tCannot parse: v1"
        );
        assert_eq!(
            diag.detail.as_deref(),
            Some("Error! Expecting trigger here: \"v1\"")
        );
        assert_eq!(diag.line, Some(2));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(DiagnosticKind::ParseFailed, "boom")
            .with_line(10)
            .with_detail("Error! Expecting body here: \"[\"");

        let display = format!("{}", diag);
        assert!(display.contains("[PARSE_FAILED]"));
        assert!(display.contains("line 10"));
        assert!(display.contains("boom"));
        assert!(display.contains("Expecting body"));
    }

    #[test]
    fn test_collector() {
        let mut collector = DiagnosticCollector::new();
        assert!(collector.is_empty());

        collector.report(Diagnostic::new(DiagnosticKind::BadHeader, "x"));
        collector.report(Diagnostic::new(DiagnosticKind::ParseFailed, "y"));
        collector.report(Diagnostic::new(DiagnosticKind::ParseFailed, "z"));

        assert_eq!(collector.len(), 3);
        assert_eq!(collector.kind_count(DiagnosticKind::ParseFailed), 2);
        assert!(collector.has_kind(DiagnosticKind::BadHeader));
        assert!(!collector.has_kind(DiagnosticKind::LineTooLong));
        assert_eq!(
            collector.filter_by_kind(DiagnosticKind::ParseFailed).len(),
            2
        );
    }
}
