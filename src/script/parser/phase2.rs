//! # 阶段 2：行文法
//!
//! 把一条逻辑行解析为 [`Line`] AST。手写递归下降，无 regex 依赖，
//! 空白敏感（除文法本身匹配到的字符外不跳过任何空白）。
//!
//! ## 失败模型
//!
//! 失败分两类。软失败回溯：备选分支在原位置重试，全部落空时
//! 整行以 `script line` 产生式报错，尾串是整行原文。硬失败即断：
//! 一旦某个产生式越过了它的确定点（触发器和主体收尾的 `;`、
//! 字符串常量收尾的 `^`），缺失就以该产生式之名中止整行。

use crate::error::{ParseError, Production};
use crate::script::ast::{
    ArithOp, Body, BodyItem, Command, CommandKind, Comparison, CondTerm, Condition, IExp, IExpVal,
    Identifier, IdentifierItem, Instruction, Line, PostObTrigger, Receiver, Trigger,
};

/// 解析一条逻辑行
///
/// 纯函数：相同输入产出结构相等的 AST 或相同的错误。
pub fn parse_line(text: &str) -> Result<Line, ParseError> {
    LineParser::new(text).script_line()
}

/// 行文法的字符游标
struct LineParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> LineParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, prefix: &str) -> bool {
        if self.remaining().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn error_at(&self, production: Production, pos: usize) -> ParseError {
        ParseError::new(production, &self.input[pos..])
    }

    fn error_here(&self, production: Production) -> ParseError {
        self.error_at(production, self.pos)
    }

    /// script_line = (command | comment_line | empty) end_of_input
    fn script_line(&mut self) -> Result<Line, ParseError> {
        if self.input.is_empty() {
            return Ok(Line::Empty);
        }
        if !self.input.starts_with('!') {
            // 注释行整体保留，含首字符
            return Ok(Line::CommentLine(self.input.to_string()));
        }
        match self.command()? {
            Some(command) => Ok(Line::Command(command)),
            // 所有软失败都回溯到这里，以整行为尾串报错
            None => Err(self.error_at(Production::ScriptLine, 0)),
        }
    }

    /// command = '!' ('?' trigger | ('!'|"d!"|" !") receiver | '#' instruction | post_ob) comment
    ///
    /// 四种命令按列出顺序尝试，前缀首个匹配即提交。
    fn command(&mut self) -> Result<Option<Command>, ParseError> {
        self.consume_char(); // 开头的 '!'
        let cmd = if self.eat('?') {
            match self.cmd_name() {
                Some(name) => CommandKind::Trigger(self.trigger(name)?),
                None => return Ok(None),
            }
        } else if self.eat('!') || self.eat_str("d!") || self.eat_str(" !") {
            let name = match self.cmd_name() {
                Some(name) => name,
                None => return Ok(None),
            };
            match self.receiver(name)? {
                Some(receiver) => CommandKind::Receiver(receiver),
                None => return Ok(None),
            }
        } else if self.eat('#') {
            let name = match self.cmd_name() {
                Some(name) => name,
                None => return Ok(None),
            };
            match self.instruction(name)? {
                Some(instruction) => CommandKind::Instruction(instruction),
                None => return Ok(None),
            }
        } else if self.eat_str("$OB") {
            CommandKind::PostObTrigger(self.post_ob_trigger()?)
        } else {
            return Ok(None);
        };
        let comment = self.comment();
        Ok(Some(Command { cmd, comment }))
    }

    /// cmd_name：恰好两个任意字符，不与其后的标识符解析合并
    fn cmd_name(&mut self) -> Option<String> {
        let start = self.pos;
        self.consume_char()?;
        if self.consume_char().is_none() {
            self.pos = start;
            return None;
        }
        Some(self.input[start..self.pos].to_string())
    }

    /// trigger = cmd_name identifier? condition? ';'
    fn trigger(&mut self, name: String) -> Result<Trigger, ParseError> {
        let identifier = self.identifier();
        let condition = self.condition();
        if !self.eat(';') {
            return Err(self.error_here(Production::Trigger));
        }
        Ok(Trigger {
            name,
            identifier,
            condition,
        })
    }

    /// receiver = cmd_name identifier? condition? body
    ///
    /// 缺少 `:` 开头的主体是软失败（无主体的接收器不被文法接受）。
    fn receiver(&mut self, name: String) -> Result<Option<Receiver>, ParseError> {
        let identifier = self.identifier();
        let condition = self.condition();
        match self.body()? {
            Some(body) => Ok(Some(Receiver {
                name,
                identifier,
                condition,
                body,
            })),
            None => Ok(None),
        }
    }

    /// instruction = cmd_name identifier? condition? body
    fn instruction(&mut self, name: String) -> Result<Option<Instruction>, ParseError> {
        let identifier = self.identifier();
        let condition = self.condition();
        match self.body()? {
            Some(body) => Ok(Some(Instruction {
                name,
                identifier,
                condition,
                body,
            })),
            None => Ok(None),
        }
    }

    /// post_ob_trig = "$OB" identifier? condition? ';'
    fn post_ob_trigger(&mut self) -> Result<PostObTrigger, ParseError> {
        let identifier = self.identifier();
        let condition = self.condition();
        if !self.eat(';') {
            return Err(self.error_here(Production::PostObTrigger));
        }
        Ok(PostObTrigger {
            identifier,
            condition,
        })
    }

    /// identifier = ident_item ('/' ident_item)*
    ///
    /// 没有消费任何字符时视为缺省（空 i-表达式不构成标识符）。
    fn identifier(&mut self) -> Option<Identifier> {
        let start = self.pos;
        let mut items = Vec::new();
        loop {
            items.push(self.ident_item());
            if self.eat('/') {
                continue;
            }
            match self.peek_char() {
                None => break,
                Some(c) if is_identifier_end(c) => break,
                // 算术项之后允许不带分隔符的后续项
                Some(_) => continue,
            }
        }
        if self.pos == start { None } else { Some(items) }
    }

    /// ident_item = iexp | arith_op
    ///
    /// 先解析 i-表达式；其后紧跟 `/` 或标识符终止符则提交，
    /// 否则该字符作为运算符、再取一个 i-表达式构成算术项。
    fn ident_item(&mut self) -> IdentifierItem {
        let lhs = self.iexp();
        match self.peek_char() {
            None => IdentifierItem::IExp(lhs),
            Some(c) if c == '/' || is_identifier_end(c) => IdentifierItem::IExp(lhs),
            Some(opcode) => {
                self.consume_char();
                let rhs = self.iexp();
                IdentifierItem::Arith(ArithOp { lhs, opcode, rhs })
            }
        }
    }

    /// condition = ('&'|'|'|'X'|'/') (comparison | int) condition?
    ///
    /// 右递归构成条件链，首个类型字符属于最外层节点。
    fn condition(&mut self) -> Option<Condition> {
        let ctype = match self.peek_char() {
            Some(c @ ('&' | '|' | 'X' | '/')) => {
                self.consume_char();
                c
            }
            _ => return None,
        };
        let cond = self.cond_term();
        let rhs = self.condition().map(Box::new);
        Some(Condition { ctype, cond, rhs })
    }

    /// comparison = iexp ('<'|'='|'>')* iexp
    ///
    /// 比较永远成功（两侧 i-表达式都可为空），因此只消费了
    /// 一个裸整数的条件项降格为条件标志。
    fn cond_term(&mut self) -> CondTerm {
        let lhs = self.iexp();
        let sign_start = self.pos;
        while matches!(self.peek_char(), Some('<' | '=' | '>')) {
            self.consume_char();
        }
        let cmp_sign = self.input[sign_start..self.pos].to_string();
        let rhs = self.iexp();

        if cmp_sign.is_empty() && rhs.is_empty() && lhs.varsym.is_none() {
            if let Some(IExpVal::Int(flag)) = lhs.val {
                return CondTerm::Flag(flag);
            }
        }
        CondTerm::Comparison(Comparison { lhs, cmp_sign, rhs })
    }

    /// iexp = varsym? (int | macro)?
    ///
    /// 两部分都缺省时是合法的空占位。
    fn iexp(&mut self) -> IExp {
        let varsym = self.varsym();
        let val = self.iexp_val();
        IExp { varsym, val }
    }

    /// 小写字母串。以 `u` 开头的串不构成变量符号
    fn varsym(&mut self) -> Option<String> {
        match self.peek_char() {
            Some('u') => None,
            Some(c) if c.is_ascii_lowercase() => {
                let start = self.pos;
                while matches!(self.peek_char(), Some(c) if c.is_ascii_lowercase()) {
                    self.consume_char();
                }
                Some(self.input[start..self.pos].to_string())
            }
            _ => None,
        }
    }

    fn iexp_val(&mut self) -> Option<IExpVal> {
        if let Some(value) = self.integer() {
            return Some(IExpVal::Int(value));
        }
        self.macro_name().map(IExpVal::Macro)
    }

    /// 可带符号的十进制整数。越出 i32 范围视为不匹配，不消费字符
    fn integer(&mut self) -> Option<i32> {
        let start = self.pos;
        if matches!(self.peek_char(), Some('+' | '-')) {
            self.consume_char();
        }
        let digits_start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.consume_char();
        }
        if self.pos == digits_start {
            self.pos = start;
            return None;
        }
        match self.input[start..self.pos].parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// macro = '$' (any_char_except '$')* '$'
    ///
    /// 值是两个美元符号之间的内容。未闭合时整体不消费
    fn macro_name(&mut self) -> Option<String> {
        if self.peek_char() != Some('$') {
            return None;
        }
        let rest = &self.input[self.pos + 1..];
        let end = rest.find('$')?;
        let name = rest[..end].to_string();
        self.pos += 1 + end + 1;
        Some(name)
    }

    /// body = ':' (body_char | string_lit | macro)* ';'
    ///
    /// 空主体 `:;` 合法。缺少 `:` 是软失败，越过 `:` 之后
    /// 缺少 `;` 以 `body` 之名中止。
    fn body(&mut self) -> Result<Option<Body>, ParseError> {
        if !self.eat(':') {
            return Ok(None);
        }
        let mut items = Vec::new();
        loop {
            match self.peek_char() {
                Some(';') => {
                    self.consume_char();
                    return Ok(Some(items));
                }
                Some('^') => items.push(BodyItem::StringLit(self.string_lit()?)),
                Some('$') => match self.macro_name() {
                    Some(name) => items.push(BodyItem::Macro(name)),
                    // 未闭合的宏不是主体项
                    None => return Err(self.error_here(Production::Body)),
                },
                Some(c) if is_body_char(c) => {
                    self.consume_char();
                    items.push(BodyItem::Char(c));
                }
                _ => return Err(self.error_here(Production::Body)),
            }
        }
    }

    /// string_lit = '^' (any_char_except '^')* '^'
    ///
    /// 内容可含换行（跨行字符串在阶段 1 已拼回同一条逻辑行）。
    fn string_lit(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.consume_char(); // 开头的 '^'
        match self.remaining().find('^') {
            Some(end) => {
                let content = self.remaining()[..end].to_string();
                self.pos += end + 1;
                Ok(content)
            }
            None => {
                self.pos = start;
                Err(self.error_here(Production::StringConstant))
            }
        }
    }

    /// comment = any_char*，行内剩余全部字符
    fn comment(&mut self) -> String {
        let comment = self.remaining().to_string();
        self.pos = self.input.len();
        comment
    }
}

/// 标识符的终止字符：主体或命令收尾，以及条件链的入口
fn is_identifier_end(c: char) -> bool {
    matches!(c, ';' | ':' | '&' | '|' | 'X')
}

/// 主体字符白名单。`,` 和 `.` 同样在集合内
fn is_body_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "/ @*?%+,-.:|&=><".contains(c)
}
