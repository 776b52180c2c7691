//! # Error 模块
//!
//! 定义文法错误类型与产生式名。

use std::fmt;

use thiserror::Error;

/// 文法产生式，诊断消息中以人类可读名出现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    StringConstant,
    IExpression,
    Comment,
    CommentLine,
    CmdName,
    Identifier,
    Condition,
    Trigger,
    Body,
    Instruction,
    Receiver,
    PostObTrigger,
    Command,
    ScriptLine,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StringConstant => "string constant",
            Self::IExpression => "i-expression",
            Self::Comment => "comment",
            Self::CommentLine => "comment line",
            Self::CmdName => "name of a command",
            Self::Identifier => "identifier",
            Self::Condition => "condition",
            Self::Trigger => "trigger",
            Self::Body => "body",
            Self::Instruction => "instruction",
            Self::Receiver => "receiver",
            Self::PostObTrigger => "post OB trigger",
            Self::Command => "command",
            Self::ScriptLine => "script line",
        };
        write!(f, "{}", name)
    }
}

/// 文法错误：某个产生式在失败位置期望更多输入
///
/// `tail` 是从失败位置到行尾的原文。
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error! Expecting {production} here: \"{tail}\"")]
pub struct ParseError {
    pub production: Production,
    pub tail: String,
}

impl ParseError {
    pub fn new(production: Production, tail: impl Into<String>) -> Self {
        Self {
            production,
            tail: tail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_names() {
        assert_eq!(Production::IExpression.to_string(), "i-expression");
        assert_eq!(Production::CmdName.to_string(), "name of a command");
        assert_eq!(Production::PostObTrigger.to_string(), "post OB trigger");
        assert_eq!(Production::ScriptLine.to_string(), "script line");
    }

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::new(Production::Trigger, "^tail");
        assert_eq!(
            error.to_string(),
            "Error! Expecting trigger here: \"^tail\""
        );
    }
}
