// SPDX-License-Identifier: Apache-2.0

pub(crate) mod ops;
pub(crate) mod pipeline;
pub(crate) mod request_support;
pub(crate) mod samples;
pub(crate) mod taxonomy;
pub(crate) mod upload;
pub(crate) mod vault;
