//! Block statement compilation.

use water_parser::ast::Block;

use super::StmtCompiler;
use crate::error::Result;

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    /// Compile `{ ... }`. Locals declared inside are forgotten at the
    /// closing brace.
    pub fn compile_block(&mut self, block: &'ast Block<'ast>) -> Result<()> {
        self.frame.locals.push_scope();
        let result = self.compile_stmts(block.stmts);
        self.frame.locals.pop_scope();
        result
    }
}
