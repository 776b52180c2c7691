//! # ERM Parser
//!
//! ERM（Event Related Model）脚本语言的解析器核心。
//!
//! ## 架构概述
//!
//! ERM 脚本存放在 ZVSE 格式的文本文件中。解析器按行驱动：
//!
//! ```text
//! 字节流 → 物理行 → [归类 + 拼接] → 逻辑行 → [行文法] → Line AST → 下游消费者
//! ```
//!
//! `^…^` 字符串常量可以跨越换行，阶段 1 负责把这样的命令
//! 拼回一条逻辑行；阶段 2 对每条逻辑行跑递归下降文法，产出
//! 带标签变体的 [`Line`] AST。单行失败经由诊断接收器上报后
//! 跳过，文件解析继续。
//!
//! ## 核心类型
//!
//! - [`ErmParser`]：文件解析入口
//! - [`Script`]：解析产出的 AST 流（带 source map）
//! - [`Line`] / [`Command`]：单条逻辑行的 AST
//! - [`DiagnosticSink`]：注入的错误上报通道
//!
//! ## 使用示例
//!
//! ```no_run
//! use erm_parser::{DiagnosticCollector, ErmParser};
//!
//! let parser = ErmParser::new("data/s/story.erm");
//! let mut sink = DiagnosticCollector::new();
//! let script = parser.parse_file(&mut sink);
//!
//! for (index, command) in script.commands().enumerate() {
//!     println!("{:?} (line {:?})", command.cmd.name(), script.source_line(index));
//! }
//! for diagnostic in &sink.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`diagnostic`]：诊断条目与接收器
//! - [`error`]：文法错误类型
//! - [`script`]：AST 与两阶段解析器

pub mod diagnostic;
pub mod error;
pub mod script;

// 重导出核心类型
pub use diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind, DiagnosticSink, LogSink};
pub use error::{ParseError, Production};
pub use script::parser::{
    Feed, LineAssembler, LineKind, LogicalLine, MAX_LOGICAL_LINE, MAX_PHYSICAL_LINE, PhysicalLine,
    SourceReader, classify_line, count_hats_before_semicolon, parse_line,
};
pub use script::{
    ArithOp, Body, BodyItem, Command, CommandKind, Comparison, CondTerm, Condition, ErmParser,
    IExp, IExpVal, Identifier, IdentifierItem, Instruction, Line, PostObTrigger, Receiver, Script,
    Trigger,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _parser = ErmParser::new("scripts/test.erm");

        let _kind = classify_line("!?FU;", false);

        let _line = parse_line("!?FU;").unwrap();

        let mut sink = DiagnosticCollector::new();
        sink.report(Diagnostic::new(DiagnosticKind::ParseFailed, "x"));
        assert_eq!(sink.len(), 1);
    }
}
