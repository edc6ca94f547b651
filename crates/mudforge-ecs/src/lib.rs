//! The entity/component registry behind a Mudforge world.
//!
//! Everything that exists in the game (a player mid-login, a player in the
//! world, a freshly accepted connection) is an **entity**: a recyclable id
//! plus a set of **components** describing its current state. Behaviour
//! lives in **systems**, which never hold entity data themselves. They
//! subscribe to **events** on the world's bus and react by changing
//! components or emitting more events.
//!
//! ```text
//!            ┌──────────────── World ────────────────┐
//!  emit ───→ │ bus ──→ system handlers (in order)    │
//!            │            │                          │
//!            │            ▼                          │
//!            │ entities + component index ──→ emit   │
//!            └───────────────────────────────────────┘
//! ```
//!
//! # Dispatch model
//!
//! The bus is synchronous and re-entrant: [`World::emit`] runs every
//! current subscriber to completion, in subscription order, before it
//! returns, and a handler may emit further events from inside itself.
//! Subscription order is therefore part of the contract: register the
//! systems whose handlers must observe state first, first.
//!
//! The world is single-owner. Whoever holds `&mut World` is the only
//! writer; multi-threaded servers hand it to one task and feed that task
//! over a channel.
//!
//! # Key types
//!
//! - [`World`]: entities, component index, bus and attached systems
//! - [`Entity`], [`EntityId`]: a generational id and its components
//! - [`Component`] and its payloads ([`HasConnection`], [`LoggingIn`],
//!   [`LoggingOut`], [`InGameWorld`])
//! - [`Event`] and its payloads, [`BusEvent`] for typed subscriptions
//! - [`System`], [`SystemContext`], [`Subscriptions`]

mod bus;
mod component;
mod entity;
mod error;
mod event;
mod system;
mod world;

pub use bus::SubscriptionId;
pub use component::{
    Component, ComponentData, ComponentKind, HasConnection, InGameWorld, LoggingIn, LoggingOut,
    LoginState,
};
pub use entity::{Entity, EntityId};
pub use error::EcsError;
pub use event::{
    BusEvent, ComponentAssigned, ComponentRemoved, EntityCreated, EntityDeleted, Event, EventKind,
    LoginSuccess, PerformDisconnect, PlayerInput, SendData, SwitchConnOwnership,
};
pub use system::{System, SystemContext, SystemId, Subscriptions};
pub use world::World;
