/// Two interchangeable targets: one is read while the other is written.
///
/// Passes alternate by toggling which slot is read; texture contents are
/// never copied between the two.
#[derive(Debug)]
pub struct PingPong<T> {
    targets: [T; 2],
    read: usize,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            targets: [first, second],
            read: 0,
        }
    }

    /// The slot holding the latest result.
    #[inline]
    pub fn read(&self) -> &T {
        &self.targets[self.read]
    }

    /// The slot the next pass renders into.
    #[inline]
    pub fn write(&self) -> &T {
        &self.targets[self.read ^ 1]
    }

    #[inline]
    pub fn read_index(&self) -> usize {
        self.read
    }

    /// Make the last written slot the readable one.
    #[inline]
    pub fn swap(&mut self) {
        self.read ^= 1;
    }

    pub fn reset(&mut self) {
        self.read = 0;
    }

    /// Exchange the readable target with `spare`, keeping the latest result
    /// alive outside the pair.
    pub fn exchange_read(&mut self, spare: &mut T) {
        std::mem::swap(&mut self.targets[self.read], spare);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.targets.iter()
    }
}
