pub(crate) mod extract;
pub(crate) mod feedback;
pub(crate) mod notify;
pub(crate) mod rubric;
