//! Probe declarations and probe-point specification grammar.
//!
//! ```text
//! probe <probe-point-spec> [, <probe-point-spec>]* <block>
//! probe-point-spec := component ('.' component)* ('?' | '!')?
//! component        := name | name '(' literal ')'
//! ```
//! `name` may contain `*` wildcards; they're matched against sibling keys in
//! the match tree at elaboration time, not expanded here.

use crate::ast::{Component, MatchModifier, ProbePointSpec, SourceProbe};
use crate::token::{Op, TokenKind};

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_probe(&mut self) -> Option<crate::ast::SourceProbeId> {
        self.bump(); // 'probe'
        let loc = self.loc();

        let mut locations = Vec::new();
        loop {
            locations.push(self.parse_probe_point_spec());
            if !self.eat_op(Op::Comma) {
                break;
            }
        }

        let body = self.parse_block();
        let locals = self.take_collected_locals();

        let probe = SourceProbe { locations, body, locals, loc, referenced: false };
        Some(self.session.probes.alloc(probe))
    }

    fn parse_probe_point_spec(&mut self) -> ProbePointSpec {
        let mut components = Vec::new();
        loop {
            components.push(self.parse_component());
            if !self.eat_op(Op::Dot) {
                break;
            }
        }

        let modifier = if self.eat_op(Op::Question) {
            MatchModifier::Optional
        } else if self.at_op(Op::Bang) {
            self.bump();
            MatchModifier::Required
        } else {
            MatchModifier::Plain
        };

        ProbePointSpec { components, modifier }
    }

    fn parse_component(&mut self) -> Component {
        let loc = self.loc();
        let name = self.parse_component_name();

        let arg = if self.eat_op(Op::LParen) {
            let value = self.parse_literal_value();
            self.expect_op(Op::RParen, "')' after probe-point argument");
            match value {
                Some(crate::ast::ComponentArg::Number(n)) => Some(crate::ast::ComponentArg::Number(n)),
                Some(crate::ast::ComponentArg::Str(s)) => Some(crate::ast::ComponentArg::Str(s)),
                None => {
                    self.error("expected a literal probe-point argument".to_string());
                    None
                }
            }
        } else {
            None
        };

        Component { name, arg, loc }
    }

    /// Builds a component's dotted-segment name, accepting embedded `*`
    /// wildcards (`sys_*`, `*`, `*_enter`) by greedily consuming adjacent
    /// identifier and `*` tokens until something that can't belong to a
    /// component name (`.`, `(`, `,`, `?`, `!`, a brace, or end of file).
    fn parse_component_name(&mut self) -> String {
        let mut s = String::new();
        loop {
            match self.cur().kind.clone() {
                TokenKind::Ident(sym) => {
                    s.push_str(self.session.interner.resolve(sym));
                    self.bump();
                }
                TokenKind::Op(Op::Star) => {
                    s.push('*');
                    self.bump();
                }
                _ => break,
            }
            if matches!(
                self.cur().kind,
                TokenKind::Op(Op::Dot)
                    | TokenKind::Op(Op::LParen)
                    | TokenKind::Op(Op::Comma)
                    | TokenKind::Op(Op::LBrace)
                    | TokenKind::Op(Op::Question)
                    | TokenKind::Op(Op::Bang)
                    | TokenKind::Eof
            ) {
                break;
            }
        }
        if s.is_empty() {
            self.error("expected a probe-point component name".to_string());
        }
        s
    }
}
