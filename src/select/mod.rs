pub(crate) mod highlight;
