mod annotation;
mod pipeline;
