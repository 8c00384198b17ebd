/// Caller-provided output slice plus how much of it has been written
///
/// Every poll loop writes through this, one byte at a time.
/// Callers must check for room before writing.
pub(crate) struct BufOutput<'a> {
    pub pos: usize,
    pub buf: &'a mut [u8],
}
impl<'a> From<&'a mut [u8]> for BufOutput<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        Self { pos: 0, buf }
    }
}
impl<'a> BufOutput<'a> {
    pub fn can_take_byte(&self) -> bool {
        self.pos < self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn putc(&mut self, c: u8) {
        debug_assert!(self.can_take_byte());
        self.buf[self.pos] = c;
        self.pos += 1;
    }
}
