/// Screen-language and test-case sub-decompilers
///
/// Both sub-languages are decompiled elsewhere. A sub-decompiler writes its
/// lines into the shared buffer and reports the next unused line number.

use serde_json::Value;

use crate::decompiler::lines::LineBuffer;

pub trait SubDecompiler {
    fn decompile(&self, node: &Value, lines: &mut LineBuffer, indent: usize) -> anyhow::Result<usize>;
}

impl<F> SubDecompiler for F
where
    F: Fn(&Value, &mut LineBuffer, usize) -> anyhow::Result<usize>,
{
    fn decompile(&self, node: &Value, lines: &mut LineBuffer, indent: usize) -> anyhow::Result<usize> {
        self(node, lines, indent)
    }
}
