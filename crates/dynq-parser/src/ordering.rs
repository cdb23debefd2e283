//! Ordering-clause parsing: `expr [asc|ascending|desc|descending], ...`.

use dynq_common::{ParseError, ParseErrorKind, TokenKind};
use dynq_types::{Expr, Param};

use crate::parser::Parser;

/// One ordering clause, ready for a query surface to consume.
#[derive(Clone, Debug, PartialEq)]
pub struct Ordering {
    /// The key selector, referencing `parameter`.
    pub selector: Expr,
    /// The iteration parameter the selector is written over.
    pub parameter: Param,
    pub ascending: bool,
}

impl Parser<'_> {
    /// Parse the full comma-separated ordering list. Direction words are
    /// recognized case-insensitively and default to ascending.
    pub(crate) fn parse_ordering_list(
        &mut self,
        param: &Param,
    ) -> Result<Vec<Ordering>, ParseError> {
        let mut orderings = Vec::new();
        loop {
            let selector = self.parse_expression()?;
            let mut ascending = true;
            if self.token_is_ident("asc") || self.token_is_ident("ascending") {
                self.bump()?;
            } else if self.token_is_ident("desc") || self.token_is_ident("descending") {
                self.bump()?;
                ascending = false;
            }
            orderings.push(Ordering {
                selector,
                parameter: param.clone(),
                ascending,
            });
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.bump()?;
        }
        self.expect(TokenKind::End, ParseErrorKind::SyntaxError)?;
        Ok(orderings)
    }
}
