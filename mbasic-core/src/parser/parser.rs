use super::error::{ParseResult, ParserError, ParserErrorKind, MAX_LINE_NUMBER, MAX_NESTING};
use super::expr::{Builtin, Expr, UnaryOp, Var};
use super::program::{Program, ProgramLine};
use super::stmt::{ModeSpec, PrintItem, Stmt};
use super::utils::{binary_op, get_precedence, NEG_PRECEDENCE, NOT_PRECEDENCE};
use crate::lexer::{Coordinate, Token, TokenKind};
use mbasic_vfs::OpenMode;
use tracing::debug;

const TARGET: &str = "mbasic::parser";

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// 当前递归层数：括号、一元运算、函数参数、右操作数、嵌套 IF
    nesting: usize,
}

impl Parser {
    /// `tokens` 必须以 `Eof` 结尾（`Lexer::tokenize` 的输出满足这一点）
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, crate::lexer::Span::at(end), ""));
        }
        Self {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    /// 解析整个程序
    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut lines = Vec::new();
        loop {
            while self.match_token(TokenKind::Newline) {}
            if self.check(TokenKind::Eof) {
                break;
            }
            lines.push(self.parse_line()?);
        }
        let program = Program::new(lines);
        debug!(
            target: TARGET,
            lines = program.len(),
            statements = program.statement_count(),
            "program parsed"
        );
        Ok(program)
    }

    // ===== token 游标 =====

    fn current(&self) -> &Token {
        // pos 永远不会越过末尾的 Eof
        &self.tokens[self.pos]
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// 消费当前token并读取下一个
    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// 检查当前token是否为指定类型
    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// 匹配并消费指定类型的token
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// 进入一层嵌套；超过 `MAX_NESTING` 报错而不是继续递归
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error_here(ParserErrorKind::TooComplex));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn current_coordinate(&self) -> Coordinate {
        self.current().span.start
    }

    fn current_token_text(&self) -> String {
        let token = self.current();
        match token.kind {
            TokenKind::Identifier | TokenKind::Number => format!("'{}'", token.text),
            TokenKind::String => format!("\"{}\"", token.text),
            kind => kind.describe().to_string(),
        }
    }

    /// 创建带有当前位置的错误
    fn error_here(&self, kind: ParserErrorKind) -> ParserError {
        if self.check(TokenKind::Eof) {
            ParserError::at_eof(kind)
        } else {
            ParserError::here(kind, self.current_coordinate())
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParserError {
        self.error_here(ParserErrorKind::UnexpectedToken {
            found: self.current_token_text(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// 期望并消费指定类型的token，否则返回错误
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            Err(self.unexpected(&[kind.describe()]))
        }
    }

    /// 期望一个变量名
    fn expect_variable(&mut self) -> ParseResult<Var> {
        if self.check(TokenKind::Identifier) {
            let token = self.consume();
            if self.check(TokenKind::LeftParen) {
                return Err(self.error_here(ParserErrorKind::Custom(format!(
                    "Arrays are not supported: {}",
                    token.text
                ))));
            }
            Ok(Var::new(token.text))
        } else {
            Err(self.error_here(ParserErrorKind::ExpectedVariable {
                found: self.current_token_text(),
            }))
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Colon | TokenKind::Else | TokenKind::Rem
        )
    }

    // ===== 行与语句 =====

    fn parse_line(&mut self) -> ParseResult<ProgramLine> {
        if !self.check(TokenKind::Number) {
            return Err(self.error_here(ParserErrorKind::MissingLineNumber));
        }
        let number = self.parse_line_number()?;
        let source_line = self.tokens[self.pos - 1].span.start.line;

        let mut statements = Vec::new();
        self.parse_statement_list(&mut statements)?;
        if !self.at_line_end() {
            return Err(self.unexpected(&[":", "end of line"]));
        }
        Ok(ProgramLine {
            number,
            source_line,
            statements,
        })
    }

    /// 行号字面量：GOTO / GOSUB / THEN 的目标也走这里
    fn parse_line_number(&mut self) -> ParseResult<u32> {
        let token = self.expect(TokenKind::Number)?;
        let number = token
            .text
            .parse::<u32>()
            .ok()
            .filter(|n| *n <= MAX_LINE_NUMBER)
            .ok_or_else(|| {
                ParserError::here(
                    ParserErrorKind::InvalidLineNumber(token.text.clone()),
                    token.span.start,
                )
            })?;
        Ok(number)
    }

    /// 以 `:` 分隔的语句序列，停在行尾或 ELSE 前
    fn parse_statement_list(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        loop {
            if self.at_line_end() || self.check(TokenKind::Else) {
                return Ok(());
            }
            if self.match_token(TokenKind::Colon) {
                continue;
            }
            self.parse_statement(out)?;
            if self.match_token(TokenKind::Rem) {
                out.push(Stmt::Rem);
            }
            if !self.match_token(TokenKind::Colon) {
                return Ok(());
            }
        }
    }

    /// 解析一条语句；IF 会展开为多条扁平语句
    fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        let token = self.current().clone();
        let stmt = match token.kind {
            TokenKind::Rem => {
                self.consume();
                Stmt::Rem
            }
            TokenKind::If => return self.nested(|p| p.parse_if(out)),
            TokenKind::Let => {
                self.consume();
                self.parse_assignment()?
            }
            TokenKind::Identifier => self.parse_assignment()?,
            TokenKind::Print => self.parse_print()?,
            TokenKind::Input => self.parse_input()?,
            TokenKind::Line => self.parse_line_input()?,
            TokenKind::Goto => {
                self.consume();
                Stmt::Goto(self.parse_line_number()?)
            }
            TokenKind::Gosub => {
                self.consume();
                Stmt::Gosub(self.parse_line_number()?)
            }
            TokenKind::Return => {
                self.consume();
                Stmt::Return
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Next => self.parse_next()?,
            TokenKind::End => {
                self.consume();
                Stmt::End
            }
            TokenKind::Stop => {
                self.consume();
                Stmt::Stop
            }
            TokenKind::Cls => {
                self.consume();
                Stmt::Cls
            }
            TokenKind::Width => {
                self.consume();
                Stmt::Width(self.parse_expression(0)?)
            }
            TokenKind::Open => self.parse_open()?,
            TokenKind::Close => self.parse_close()?,
            TokenKind::Kill => {
                self.consume();
                Stmt::Kill(self.parse_expression(0)?)
            }
            TokenKind::Name => {
                self.consume();
                let from = self.parse_expression(0)?;
                self.expect(TokenKind::As)?;
                let to = self.parse_expression(0)?;
                Stmt::Name { from, to }
            }
            TokenKind::Put | TokenKind::Get => self.parse_record_io(token.kind)?,
            _ => return Err(self.unexpected(&["statement"])),
        };
        out.push(stmt);
        Ok(())
    }

    fn parse_assignment(&mut self) -> ParseResult<Stmt> {
        let target = self.expect_variable()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression(0)?;
        Ok(Stmt::Let { target, value })
    }

    /// IF cond THEN ... [ELSE ...]
    ///
    /// 展开为 `If`、THEN 分支语句、`Else` 标记、ELSE 分支语句。
    /// 嵌套 IF 的 ELSE 归属最近的 IF。
    fn parse_if(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression(0)?;
        let if_index = out.len();
        out.push(Stmt::If {
            condition,
            else_at: None,
        });

        if self.match_token(TokenKind::Then) {
            if self.check(TokenKind::Number) {
                out.push(Stmt::Goto(self.parse_line_number()?));
            } else {
                self.parse_statement_list(out)?;
            }
        } else if self.match_token(TokenKind::Goto) {
            out.push(Stmt::Goto(self.parse_line_number()?));
        } else {
            return Err(self.unexpected(&["THEN", "GOTO"]));
        }

        if self.match_token(TokenKind::Else) {
            out.push(Stmt::Else);
            let else_at = out.len();
            if let Some(Stmt::If { else_at: slot, .. }) = out.get_mut(if_index) {
                *slot = Some(else_at);
            }
            if self.check(TokenKind::Number) {
                out.push(Stmt::Goto(self.parse_line_number()?));
            } else {
                self.parse_statement_list(out)?;
            }
        }
        Ok(())
    }

    fn parse_print(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Print)?;
        let channel = if self.match_token(TokenKind::Hash) {
            let channel = self.parse_expression(0)?;
            if !self.at_statement_end() {
                self.expect(TokenKind::Comma)?;
            }
            Some(channel)
        } else {
            None
        };

        let mut items = Vec::new();
        while !self.at_statement_end() {
            if self.match_token(TokenKind::Comma) {
                items.push(PrintItem::Comma);
            } else if self.match_token(TokenKind::Semicolon) {
                items.push(PrintItem::Semicolon);
            } else if self.check_print_function("TAB") {
                items.push(PrintItem::Tab(self.parse_print_function()?));
            } else if self.check_print_function("SPC") {
                items.push(PrintItem::Spc(self.parse_print_function()?));
            } else {
                items.push(PrintItem::Expr(self.parse_expression(0)?));
            }
        }
        Ok(Stmt::Print { channel, items })
    }

    fn check_print_function(&self, name: &str) -> bool {
        self.check(TokenKind::Identifier)
            && self.current().text == name
            && self.peek_kind(1) == TokenKind::LeftParen
    }

    fn parse_print_function(&mut self) -> ParseResult<Expr> {
        self.consume();
        self.expect(TokenKind::LeftParen)?;
        let arg = self.parse_expression(0)?;
        self.expect_right_paren()?;
        Ok(arg)
    }

    fn parse_input(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Input)?;
        if self.match_token(TokenKind::Hash) {
            let channel = self.parse_expression(0)?;
            self.expect(TokenKind::Comma)?;
            let targets = self.parse_variable_list()?;
            return Ok(Stmt::InputFile { channel, targets });
        }

        let mut prompt = None;
        let mut question = true;
        if self.check(TokenKind::String)
            && matches!(self.peek_kind(1), TokenKind::Semicolon | TokenKind::Comma)
        {
            prompt = Some(self.consume().text);
            question = self.consume().kind == TokenKind::Semicolon;
        }
        let targets = self.parse_variable_list()?;
        Ok(Stmt::Input {
            prompt,
            question,
            targets,
        })
    }

    fn parse_line_input(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Line)?;
        self.expect(TokenKind::Input)?;
        if self.match_token(TokenKind::Hash) {
            let channel = self.parse_expression(0)?;
            self.expect(TokenKind::Comma)?;
            let target = self.expect_variable()?;
            return Ok(Stmt::LineInputFile { channel, target });
        }

        let mut prompt = None;
        if self.check(TokenKind::String)
            && matches!(self.peek_kind(1), TokenKind::Semicolon | TokenKind::Comma)
        {
            prompt = Some(self.consume().text);
            self.consume();
        }
        let target = self.expect_variable()?;
        Ok(Stmt::LineInput { prompt, target })
    }

    fn parse_variable_list(&mut self) -> ParseResult<Vec<Var>> {
        let mut vars = vec![self.expect_variable()?];
        while self.match_token(TokenKind::Comma) {
            vars.push(self.expect_variable()?);
        }
        Ok(vars)
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::For)?;
        let var = self.expect_variable()?;
        self.expect(TokenKind::Equal)?;
        let start = self.parse_expression(0)?;
        self.expect(TokenKind::To)?;
        let end = self.parse_expression(0)?;
        let step = if self.match_token(TokenKind::Step) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        Ok(Stmt::For {
            var,
            start,
            end,
            step,
        })
    }

    fn parse_next(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Next)?;
        let vars = if self.at_statement_end() {
            Vec::new()
        } else {
            self.parse_variable_list()?
        };
        Ok(Stmt::Next { vars })
    }

    /// 两种写法：
    /// - `OPEN name FOR mode AS [#]n [LEN = reclen]`
    /// - `OPEN "mode", [#]n, name [, reclen]`
    fn parse_open(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Open)?;
        let first = self.parse_expression(0)?;

        if self.match_token(TokenKind::Comma) {
            self.match_token(TokenKind::Hash);
            let channel = self.parse_expression(0)?;
            self.expect(TokenKind::Comma)?;
            let name = self.parse_expression(0)?;
            let record_length = if self.match_token(TokenKind::Comma) {
                Some(self.parse_expression(0)?)
            } else {
                None
            };
            return Ok(Stmt::Open {
                name,
                mode: ModeSpec::Dynamic(first),
                channel,
                record_length,
            });
        }

        let mode = if self.match_token(TokenKind::For) {
            let mode = match self.current().kind {
                TokenKind::Input => OpenMode::Input,
                TokenKind::Output => OpenMode::Output,
                TokenKind::Append => OpenMode::Append,
                TokenKind::Random => OpenMode::Random,
                _ => return Err(self.unexpected(&["INPUT", "OUTPUT", "APPEND", "RANDOM"])),
            };
            self.consume();
            mode
        } else {
            // 省略 FOR 子句即随机访问
            OpenMode::Random
        };
        self.expect(TokenKind::As)?;
        self.match_token(TokenKind::Hash);
        let channel = self.parse_expression(0)?;

        let record_length = if self.check(TokenKind::Identifier) && self.current().text == "LEN" {
            self.consume();
            self.expect(TokenKind::Equal)?;
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        Ok(Stmt::Open {
            name: first,
            mode: ModeSpec::Fixed(mode),
            channel,
            record_length,
        })
    }

    fn parse_close(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Close)?;
        let mut channels = Vec::new();
        if !self.at_statement_end() {
            loop {
                self.match_token(TokenKind::Hash);
                channels.push(self.parse_expression(0)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(Stmt::Close { channels })
    }

    /// `PUT [#]n, [rec], expr` / `GET [#]n, [rec], var`
    fn parse_record_io(&mut self, kind: TokenKind) -> ParseResult<Stmt> {
        self.consume();
        self.match_token(TokenKind::Hash);
        let channel = self.parse_expression(0)?;
        self.expect(TokenKind::Comma)?;
        let record = if self.check(TokenKind::Comma) {
            None
        } else {
            Some(self.parse_expression(0)?)
        };
        self.expect(TokenKind::Comma)?;
        if kind == TokenKind::Put {
            let value = self.parse_expression(0)?;
            Ok(Stmt::Put {
                channel,
                record,
                value,
            })
        } else {
            let target = self.expect_variable()?;
            Ok(Stmt::Get {
                channel,
                record,
                target,
            })
        }
    }

    // ===== 表达式 =====

    /// 解析表达式（Pratt解析核心）；所有二元运算符左结合
    fn parse_expression(&mut self, min_precedence: i32) -> ParseResult<Expr> {
        self.parse_sized(min_precedence).map(|(expr, _)| expr)
    }

    /// 表达式及其树高。树高不超过 `MAX_NESTING`，求值和析构的递归深度因此有界
    fn parse_sized(&mut self, min_precedence: i32) -> ParseResult<(Expr, usize)> {
        self.nested(|p| p.parse_binary(min_precedence))
    }

    fn parse_binary(&mut self, min_precedence: i32) -> ParseResult<(Expr, usize)> {
        let (mut left, mut depth) = self.parse_unary()?;

        loop {
            let kind = self.current().kind;
            let op_precedence = get_precedence(kind);
            if op_precedence <= min_precedence {
                break;
            }
            let Some(op) = binary_op(kind) else {
                break;
            };
            let at = self.consume().span.start;
            let (right, right_depth) = self.parse_sized(op_precedence)?;
            depth = grow(depth.max(right_depth), at)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok((left, depth))
    }

    /// 解析一元表达式
    fn parse_unary(&mut self) -> ParseResult<(Expr, usize)> {
        let at = self.current_coordinate();
        if self.match_token(TokenKind::Minus) {
            let (operand, depth) = self.parse_sized(NEG_PRECEDENCE)?;
            Ok((
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                grow(depth, at)?,
            ))
        } else if self.match_token(TokenKind::Plus) {
            self.parse_sized(NEG_PRECEDENCE)
        } else if self.match_token(TokenKind::Not) {
            let (operand, depth) = self.parse_sized(NOT_PRECEDENCE)?;
            Ok((
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                grow(depth, at)?,
            ))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> ParseResult<(Expr, usize)> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.consume();
                let value = token.text.parse::<f64>().map_err(|_| {
                    ParserError::here(
                        ParserErrorKind::InvalidNumberFormat(token.text.clone()),
                        token.span.start,
                    )
                })?;
                Ok((Expr::Number(value), 1))
            }
            TokenKind::String => {
                self.consume();
                Ok((Expr::Str(token.text), 1))
            }
            TokenKind::LeftParen => {
                self.consume();
                let sized = self.parse_sized(0)?;
                self.expect_right_paren()?;
                Ok(sized)
            }
            TokenKind::Identifier => match Builtin::from_name(&token.text) {
                Some(func) => self.parse_call(func),
                None => Ok((Expr::Var(self.expect_variable()?), 1)),
            },
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    fn expect_right_paren(&mut self) -> ParseResult<()> {
        if self.match_token(TokenKind::RightParen) {
            Ok(())
        } else {
            Err(self.error_here(ParserErrorKind::MissingRightParen))
        }
    }

    fn parse_call(&mut self, func: Builtin) -> ParseResult<(Expr, usize)> {
        let start = self.consume().span.start;
        let mut args = Vec::new();
        let mut depth = 0;
        if self.match_token(TokenKind::LeftParen) {
            loop {
                // EOF(#1)、INPUT$(n, #1) 允许通道号带 `#`
                self.match_token(TokenKind::Hash);
                let (arg, arg_depth) = self.parse_sized(0)?;
                depth = depth.max(arg_depth);
                args.push(arg);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_right_paren()?;
        }

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(ParserError::here(
                ParserErrorKind::BadFunctionCall(format!(
                    "{} takes {} argument(s), got {}",
                    func.name(),
                    expected,
                    args.len()
                )),
                start,
            ));
        }
        Ok((Expr::Call { func, args }, grow(depth, start)?))
    }
}

/// 在子树之上再加一层
fn grow(depth: usize, at: Coordinate) -> ParseResult<usize> {
    if depth >= MAX_NESTING {
        Err(ParserError::here(ParserErrorKind::TooComplex, at))
    } else {
        Ok(depth + 1)
    }
}

/// 便捷函数：解析 token 序列
pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
    Parser::new(tokens).parse()
}
