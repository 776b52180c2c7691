//! # AST 模块
//!
//! 定义 ERM 脚本行的抽象语法树（Abstract Syntax Tree）。
//!
//! ## 设计说明
//!
//! AST 是解析器的输出，每条逻辑行对应一个 [`Line`]。
//! 所有节点都是带标签的和类型，穷尽匹配，无共享、无环；
//! 条件链的递归通过 `Option<Box<Condition>>` 表达。

use serde::{Deserialize, Serialize};

/// i-表达式的取值部分：整数常量或宏引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IExpVal {
    /// 整数常量
    Int(i32),
    /// 宏引用，值为 `$…$` 之间的名字
    Macro(String),
}

/// i-表达式（identifier expression），ERM 的原子
///
/// 由可选的小写变量符号和可选的取值组成，两部分都缺省时
/// 是语法上合法的空占位（出现在比较的空侧等处）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IExp {
    /// 变量符号（小写字母串，不以 `u` 开头）
    pub varsym: Option<String>,
    /// 取值（整数或宏）
    pub val: Option<IExpVal>,
}

impl IExp {
    /// 创建空占位
    pub fn empty() -> Self {
        Self::default()
    }

    /// 创建整数常量
    pub fn int(value: i32) -> Self {
        Self {
            varsym: None,
            val: Some(IExpVal::Int(value)),
        }
    }

    /// 创建纯变量符号
    pub fn var(sym: impl Into<String>) -> Self {
        Self {
            varsym: Some(sym.into()),
            val: None,
        }
    }

    /// 创建带下标的变量符号，如 `v1`
    pub fn var_int(sym: impl Into<String>, value: i32) -> Self {
        Self {
            varsym: Some(sym.into()),
            val: Some(IExpVal::Int(value)),
        }
    }

    /// 创建宏引用
    pub fn macro_ref(name: impl Into<String>) -> Self {
        Self {
            varsym: None,
            val: Some(IExpVal::Macro(name.into())),
        }
    }

    /// 两部分都缺省时为空
    pub fn is_empty(&self) -> bool {
        self.varsym.is_none() && self.val.is_none()
    }
}

/// 标识符内的算术项，如 `v1+v2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithOp {
    pub lhs: IExp,
    /// 运算符，单个任意字符
    pub opcode: char,
    pub rhs: IExp,
}

/// 标识符的一项：i-表达式或算术项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdentifierItem {
    IExp(IExp),
    Arith(ArithOp),
}

/// 标识符：源码中以 `/` 分隔的项序列，存在时非空
pub type Identifier = Vec<IdentifierItem>;

/// 比较：两个 i-表达式夹着一串比较符
///
/// `cmp_sign` 是 `<`、`=`、`>` 组成的串，可为空；
/// 空串的语义由求值器决定，解析期照单接受。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub lhs: IExp,
    pub cmp_sign: String,
    pub rhs: IExp,
}

/// 条件项：比较或条件标志
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CondTerm {
    Comparison(Comparison),
    /// 条件标志（裸整数）
    Flag(i32),
}

/// 条件链节点
///
/// `ctype` 是 `&`、`|`、`X`、`/` 之一，首个 `ctype` 属于最外层节点；
/// `rhs` 右递归续接后续条件，构成右链表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub ctype: char,
    pub cond: CondTerm,
    pub rhs: Option<Box<Condition>>,
}

/// 主体的一项：白名单字符、字符串常量或宏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyItem {
    Char(char),
    /// `^…^` 字符串常量，内容可含换行
    StringLit(String),
    Macro(String),
}

/// 主体：`:` 引入、`;` 结束的参数块
pub type Body = Vec<BodyItem>;

/// 触发器（`!?` 前缀）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// 命令名，恰好两个字符
    pub name: String,
    pub identifier: Option<Identifier>,
    pub condition: Option<Condition>,
}

/// 指令（`!#` 前缀）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,
    pub identifier: Option<Identifier>,
    pub condition: Option<Condition>,
    pub body: Body,
}

/// 接收器（`!!`、`!d!` 或 `! !` 前缀）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub identifier: Option<Identifier>,
    pub condition: Option<Condition>,
    pub body: Body,
}

/// post-OB 触发器（`!$OB` 前缀，名字固定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostObTrigger {
    pub identifier: Option<Identifier>,
    pub condition: Option<Condition>,
}

/// 四种命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    Trigger(Trigger),
    Instruction(Instruction),
    Receiver(Receiver),
    PostObTrigger(PostObTrigger),
}

impl CommandKind {
    /// 命令名。post-OB 触发器没有显式命令名
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Trigger(trigger) => Some(&trigger.name),
            Self::Instruction(instruction) => Some(&instruction.name),
            Self::Receiver(receiver) => Some(&receiver.name),
            Self::PostObTrigger(_) => None,
        }
    }
}

/// 一条完整命令：命令本体加行尾注释
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub cmd: CommandKind,
    /// 命令之后直到行尾的自由文本
    pub comment: String,
}

/// 一条逻辑行的解析结果
///
/// 不以 `!` 开头的行整体是注释行；空行解析为 [`Line::Empty`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Line {
    Command(Command),
    CommentLine(String),
    Empty,
}

impl Line {
    /// 如果是命令行，返回其命令
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(command) => Some(command),
            _ => None,
        }
    }

    /// 是否为命令行
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command(_))
    }
}
