//! System tests for `peril-pubsub`. See the `tests` directory.
