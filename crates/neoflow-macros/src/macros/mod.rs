pub(crate) mod param_index;
