use core::fmt;

use super::VerificationResult;

type Callback<'a> = Box<dyn FnOnce(VerificationResult) + Send + 'a>;

/// One-shot delivery of a handshake's result.
///
/// Holds the result once it is known and hands it to the registered callback
/// exactly once, whichever of the two arrives first.
pub(super) struct ResultNotifier<'a> {
    result: Option<VerificationResult>,
    callback: Option<Callback<'a>>,
    delivered: bool,
}

impl<'a> ResultNotifier<'a> {
    pub(super) const fn new() -> Self {
        Self {
            result: None,
            callback: None,
            delivered: false,
        }
    }

    pub(super) const fn result(&self) -> Option<VerificationResult> {
        self.result
    }

    /// Replaces any callback not yet invoked. After delivery the callback is
    /// dropped unused: the result has already been handed out.
    pub(super) fn subscribe(&mut self, callback: Callback<'a>) {
        if self.delivered {
            return;
        }

        self.callback = Some(callback);
        self.deliver();
    }

    /// Records the result. Returns `false`, leaving the first result in
    /// place, if one was already recorded.
    pub(super) fn resolve(&mut self, result: VerificationResult) -> bool {
        if self.result.is_some() {
            return false;
        }

        self.result = Some(result);
        self.deliver();

        true
    }

    fn deliver(&mut self) {
        let Some(result) = self.result else {
            return;
        };

        if let Some(callback) = self.callback.take() {
            self.delivered = true;
            callback(result);
        }
    }
}

impl fmt::Debug for ResultNotifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultNotifier")
            .field("result", &self.result)
            .field("subscribed", &self.callback.is_some())
            .field("delivered", &self.delivered)
            .finish()
    }
}
