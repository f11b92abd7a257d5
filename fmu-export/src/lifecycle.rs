use bitflags::bitflags;

bitflags! {
    /// Lifecycle states of an instance, one-hot so that the allowed-state
    /// set of an operation can be expressed as a union.
    ///
    /// Transitions are driven exclusively by the gated operations in
    /// [`crate::instance`]; every ABI entry tests membership against its
    /// allowed set before touching the model.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ModelState: u32 {
        const START_AND_END = 1;
        const INSTANTIATED = 1 << 1;
        const INITIALIZATION_MODE = 1 << 2;
        const EVENT_MODE = 1 << 3;
        const CONTINUOUS_TIME_MODE = 1 << 4;
        const STEP_COMPLETE = 1 << 5;
        const STEP_IN_PROGRESS = 1 << 6;
        const STEP_FAILED = 1 << 7;
        const STEP_CANCELED = 1 << 8;
        const TERMINATED = 1 << 9;
        const ERROR = 1 << 10;
        const FATAL = 1 << 11;
    }
}

impl ModelState {
    /// Every state an instance can be observed in after instantiation.
    pub const ANY_INSTANTIATED: ModelState = ModelState::from_bits_truncate(
        ModelState::INSTANTIATED.bits()
            | ModelState::INITIALIZATION_MODE.bits()
            | ModelState::EVENT_MODE.bits()
            | ModelState::CONTINUOUS_TIME_MODE.bits()
            | ModelState::STEP_COMPLETE.bits()
            | ModelState::STEP_IN_PROGRESS.bits()
            | ModelState::STEP_FAILED.bits()
            | ModelState::STEP_CANCELED.bits()
            | ModelState::TERMINATED.bits()
            | ModelState::ERROR.bits(),
    );
}

impl std::fmt::Display for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(ModelState, &str); 12] = [
            (ModelState::START_AND_END, "StartAndEnd"),
            (ModelState::INSTANTIATED, "Instantiated"),
            (ModelState::INITIALIZATION_MODE, "InitializationMode"),
            (ModelState::EVENT_MODE, "EventMode"),
            (ModelState::CONTINUOUS_TIME_MODE, "ContinuousTimeMode"),
            (ModelState::STEP_COMPLETE, "StepComplete"),
            (ModelState::STEP_IN_PROGRESS, "StepInProgress"),
            (ModelState::STEP_FAILED, "StepFailed"),
            (ModelState::STEP_CANCELED, "StepCanceled"),
            (ModelState::TERMINATED, "Terminated"),
            (ModelState::ERROR, "Error"),
            (ModelState::FATAL, "Fatal"),
        ];
        match NAMES.iter().find(|(state, _)| *state == *self) {
            Some((_, name)) => write!(f, "{name}"),
            None => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_one_hot() {
        let states = [
            ModelState::START_AND_END,
            ModelState::INSTANTIATED,
            ModelState::INITIALIZATION_MODE,
            ModelState::EVENT_MODE,
            ModelState::CONTINUOUS_TIME_MODE,
            ModelState::STEP_COMPLETE,
            ModelState::STEP_IN_PROGRESS,
            ModelState::STEP_FAILED,
            ModelState::STEP_CANCELED,
            ModelState::TERMINATED,
            ModelState::ERROR,
            ModelState::FATAL,
        ];
        for state in states {
            assert_eq!(state.bits().count_ones(), 1);
        }
        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                assert!(!a.intersects(*b));
            }
        }
    }

    #[test]
    fn any_instantiated_excludes_fatal_and_start() {
        assert!(!ModelState::ANY_INSTANTIATED.intersects(ModelState::FATAL));
        assert!(!ModelState::ANY_INSTANTIATED.intersects(ModelState::START_AND_END));
        assert!(ModelState::ANY_INSTANTIATED.contains(ModelState::TERMINATED));
    }

    #[test]
    fn membership_is_a_bit_test() {
        let allowed = ModelState::EVENT_MODE
            | ModelState::CONTINUOUS_TIME_MODE
            | ModelState::STEP_COMPLETE
            | ModelState::STEP_FAILED;
        assert!(allowed.intersects(ModelState::STEP_COMPLETE));
        assert!(!allowed.intersects(ModelState::INSTANTIATED));
    }
}
