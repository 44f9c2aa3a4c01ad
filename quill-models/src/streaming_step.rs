// Copyright (c) 2025 QUILL LABS <info@quill.net>

//! Resumable cursor threaded through successive paginated reads

/// Streaming step cursor, threaded through successive paginated reads
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum StreamingStep<T> {
    /// Started step, only when launching the streaming
    Started,
    /// Ongoing step, as long as you are streaming; holds the last item read
    Ongoing(T),
    /// Finished step, after all the information has been streamed
    Finished,
}

impl<T> StreamingStep<T> {
    /// Indicates if the current step is finished or not without caring about
    /// the cursor value
    pub fn finished(&self) -> bool {
        matches!(self, StreamingStep::Finished)
    }
}
