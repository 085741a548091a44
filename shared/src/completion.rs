/// Where explicit completion changes are recorded (wiki account or local
/// storage). Fetching the initial list is the adapter's job.
pub trait CompletionStore {
    fn record_completion(&mut self, marker_id: &str, completed: bool);
    fn clear_completion(&mut self);
}
