// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::event::Event;

/// A subscriber invoked once per dispatched event of the types it is
/// registered for.
///
/// Listeners have no return channel to the publisher. Failures are handled
/// (and logged) inside `handle`; a panic is caught by the bus and logged.
#[async_trait]
pub trait Listener: Send + Sync {
	fn name(&self) -> &str;

	async fn handle(&self, event: Arc<Event>);
}

/// Adapts an async closure into a [`Listener`].
pub struct FnListener<F, Fut> {
	name: String,
	f: F,
	_fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnListener<F, Fut>
where
	F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	pub fn new(name: impl Into<String>, f: F) -> Self {
		Self {
			name: name.into(),
			f,
			_fut: PhantomData,
		}
	}
}

#[async_trait]
impl<F, Fut> Listener for FnListener<F, Fut>
where
	F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	fn name(&self) -> &str {
		&self.name
	}

	async fn handle(&self, event: Arc<Event>) {
		(self.f)(event).await
	}
}
