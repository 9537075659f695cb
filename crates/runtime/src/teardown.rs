/// Release steps run once, last registered first.
///
/// Each acquisition registers its matching release right after it
/// succeeds, so a partially built instance unwinds with the same call as a
/// fully built one.
#[derive(Default)]
pub struct Teardown {
    steps: Vec<(&'static str, Box<dyn FnOnce()>)>,
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|(name, _)| *name).collect();
        f.debug_struct("Teardown").field("steps", &names).finish()
    }
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, release: impl FnOnce() + 'static) {
        self.steps.push((name, Box::new(release)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs and drops every step, newest first; returns the names in the
    /// order they ran.
    /// Later calls find nothing left to do.
    pub fn run(&mut self) -> Vec<&'static str> {
        let mut ran = Vec::with_capacity(self.steps.len());
        for (name, release) in self.steps.drain(..).rev() {
            release();
            ran.push(name);
        }
        ran
    }
}
