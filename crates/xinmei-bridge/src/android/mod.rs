// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each capability is a short sequence of JNI calls
// into the ART runtime against the hosting Activity:
//
//   MessageStore          ContentResolver.delete / .query on content://sms
//   SubscriptionRegistry  SubscriptionManager.getActiveSubscriptionInfoList
//   DeviceSettings        Settings.Secure.getString
//
// The host needs READ_SMS / WRITE_SMS (and, for deletes to stick, the default
// SMS app role) plus READ_PHONE_STATE. Missing permissions surface as a Java
// `SecurityException`, which is cleared here and reported as
// `AccessFault::PermissionDenied`.

#![cfg(target_os = "android")]

use jni::objects::{JByteArray, JObject, JObjectArray, JString, JValue};
use jni::sys::jsize;
use jni::{JNIEnv, JavaVM};

use xinmei_core::{AccessFault, CellValue, Collection, Row, Selection, SubscriptionRecord};

use crate::traits::*;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// `Context.TELEPHONY_SUBSCRIPTION_SERVICE`
const TELEPHONY_SUBSCRIPTION_SERVICE: &str = "telephony_subscription_service";

/// `Cursor.FIELD_TYPE_*`
const FIELD_TYPE_NULL: i32 = 0;
const FIELD_TYPE_INTEGER: i32 = 1;
const FIELD_TYPE_FLOAT: i32 = 2;
const FIELD_TYPE_STRING: i32 = 3;
const FIELD_TYPE_BLOB: i32 = 4;

/// Attach to the JVM and run `f` against the hosting Activity.
///
/// The `JavaVM*` and Activity `jobject` come from `ndk_context`, set by the
/// NDK glue (`android_main` / `ANativeActivity_onCreate`) or by the host's
/// `JNI_OnLoad`. The thread is detached again when `f` returns if it was not
/// attached before.
fn with_activity<T>(
    f: impl FnOnce(&mut JNIEnv<'_>, &JObject<'_>) -> Result<T, AccessFault>,
) -> Result<T, AccessFault> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| AccessFault::Platform(format!("failed to obtain JavaVM: {e}")))?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| AccessFault::Platform(format!("failed to attach JNI thread: {e}")))?;

    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(AccessFault::Unavailable(
            "Android context is null, activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    let activity = unsafe { JObject::from_raw(ptr.cast()) };
    f(&mut *env, &activity)
}

/// Run one JNI call and turn a failure into an [`AccessFault`], clearing any
/// pending Java exception so the next call on this thread is legal.
fn jcall<'l, T>(
    env: &mut JNIEnv<'l>,
    context: &str,
    call: impl FnOnce(&mut JNIEnv<'l>) -> jni::errors::Result<T>,
) -> Result<T, AccessFault> {
    let result = call(env);
    result.map_err(|e| fault_from(env, context, e))
}

/// Classify a JNI error. Java exceptions are cleared and mapped by type.
fn fault_from(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> AccessFault {
    if !matches!(e, jni::errors::Error::JavaException) {
        return AccessFault::Platform(format!("{context}: {e}"));
    }

    let throwable = env.exception_occurred();
    let _ = env.exception_clear();
    let Ok(throwable) = throwable else {
        return AccessFault::Platform(format!("{context}: {e}"));
    };

    let detail = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|v| v.l())
        .and_then(|s| env.get_string(&JString::from(s)).map(String::from))
        .unwrap_or_else(|_| {
            let _ = env.exception_clear();
            "unknown Java exception".into()
        });
    tracing::warn!(context, %detail, "Android: Java exception cleared");

    let is = |env: &mut JNIEnv<'_>, class: &str| {
        env.is_instance_of(&throwable, class).unwrap_or(false)
    };
    if is(env, "java/lang/SecurityException") {
        AccessFault::PermissionDenied(format!("{context}: {detail}"))
    } else if is(env, "java/lang/IllegalArgumentException") {
        AccessFault::MalformedIdentifier(format!("{context}: {detail}"))
    } else if is(env, "java/lang/IllegalStateException")
        || is(env, "android/database/sqlite/SQLiteException")
    {
        AccessFault::Unavailable(format!("{context}: {detail}"))
    } else {
        AccessFault::Platform(format!("{context}: {detail}"))
    }
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the Xinmei platform bridge.
///
/// Zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI. The first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// MessageStore — ContentResolver on content://sms
// ---------------------------------------------------------------------------

impl MessageStore for AndroidBridge {
    /// `resolver.delete(uri, "_id = ?", args)`.
    fn delete(&self, collection: Collection, selection: &Selection) -> Result<u64, AccessFault> {
        with_activity(|env, activity| {
            let resolver = content_resolver(env, activity)?;
            let uri = parse_uri(env, collection.uri())?;
            let clause = jcall(env, "new_string(selection)", |env| {
                env.new_string(selection.clause())
            })?;
            let args = string_array(env, &selection.args())?;

            let removed = jcall(env, "ContentResolver.delete", |env| {
                env.call_method(
                    &resolver,
                    "delete",
                    "(Landroid/net/Uri;Ljava/lang/String;[Ljava/lang/String;)I",
                    &[
                        JValue::Object(&uri),
                        JValue::Object(&clause),
                        JValue::Object(&args),
                    ],
                )?
                .i()
            })?;

            tracing::info!(uri = collection.uri(), removed, "Android: sms delete dispatched");
            Ok(u64::try_from(removed).unwrap_or(0))
        })
    }

    /// `resolver.query(uri, projection, "_id = ?", args, null)`, reading only
    /// the first row. The cursor is closed on every path.
    fn query_first(
        &self,
        collection: Collection,
        projection: &[&str],
        selection: &Selection,
    ) -> Result<Option<Row>, AccessFault> {
        with_activity(|env, activity| {
            let resolver = content_resolver(env, activity)?;
            let uri = parse_uri(env, collection.uri())?;
            let j_projection = string_array(env, projection)?;
            let clause = jcall(env, "new_string(selection)", |env| {
                env.new_string(selection.clause())
            })?;
            let args = string_array(env, &selection.args())?;

            let cursor = jcall(env, "ContentResolver.query", |env| {
                env.call_method(
                    &resolver,
                    "query",
                    "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                    &[
                        JValue::Object(&uri),
                        JValue::Object(&j_projection),
                        JValue::Object(&clause),
                        JValue::Object(&args),
                        JValue::Object(&JObject::null()),
                    ],
                )?
                .l()
            })?;

            if cursor.is_null() {
                return Err(AccessFault::Unavailable(format!(
                    "ContentResolver returned null cursor for {}",
                    collection.uri()
                )));
            }

            with_cursor(env, &cursor, |env| read_first_row(env, &cursor, projection))
        })
    }
}

/// Run `body` and close `cursor` afterwards, whatever `body` returned.
fn with_cursor<'l, T>(
    env: &mut JNIEnv<'l>,
    cursor: &JObject<'_>,
    body: impl FnOnce(&mut JNIEnv<'l>) -> Result<T, AccessFault>,
) -> Result<T, AccessFault> {
    let result = body(env);
    if let Err(fault) = jcall(env, "Cursor.close", |env| {
        env.call_method(cursor, "close", "()V", &[]).map(|_| ())
    }) {
        tracing::warn!(error = %fault, "Android: failed to close cursor");
    }
    result
}

fn read_first_row(
    env: &mut JNIEnv<'_>,
    cursor: &JObject<'_>,
    projection: &[&str],
) -> Result<Option<Row>, AccessFault> {
    let has_row = jcall(env, "Cursor.moveToFirst", |env| {
        env.call_method(cursor, "moveToFirst", "()Z", &[])?.z()
    })?;
    if !has_row {
        return Ok(None);
    }

    let mut row = Row::new();
    for column in projection {
        let j_column = jcall(env, "new_string(column)", |env| env.new_string(column))?;
        let index = jcall(env, "Cursor.getColumnIndex", |env| {
            env.call_method(
                cursor,
                "getColumnIndex",
                "(Ljava/lang/String;)I",
                &[JValue::Object(&j_column)],
            )?
            .i()
        })?;
        if index < 0 {
            tracing::debug!(column, "Android: column not in cursor");
            continue;
        }

        let field_type = jcall(env, "Cursor.getType", |env| {
            env.call_method(cursor, "getType", "(I)I", &[JValue::Int(index)])?.i()
        })?;
        let value = match field_type {
            FIELD_TYPE_NULL => CellValue::Null,
            FIELD_TYPE_INTEGER => CellValue::Integer(jcall(env, "Cursor.getLong", |env| {
                env.call_method(cursor, "getLong", "(I)J", &[JValue::Int(index)])?.j()
            })?),
            FIELD_TYPE_FLOAT => CellValue::Real(jcall(env, "Cursor.getDouble", |env| {
                env.call_method(cursor, "getDouble", "(I)D", &[JValue::Int(index)])?.d()
            })?),
            FIELD_TYPE_STRING => {
                let s = jcall(env, "Cursor.getString", |env| {
                    env.call_method(
                        cursor,
                        "getString",
                        "(I)Ljava/lang/String;",
                        &[JValue::Int(index)],
                    )?
                    .l()
                })?;
                java_string(env, "Cursor.getString", s)?.map_or(CellValue::Null, CellValue::Text)
            }
            FIELD_TYPE_BLOB => {
                let bytes = jcall(env, "Cursor.getBlob", |env| {
                    env.call_method(cursor, "getBlob", "(I)[B", &[JValue::Int(index)])?.l()
                })?;
                let bytes = JByteArray::from(bytes);
                CellValue::Blob(jcall(env, "convert_byte_array", |env| {
                    env.convert_byte_array(&bytes)
                })?)
            }
            other => {
                tracing::debug!(column, field_type = other, "Android: unknown cursor field type");
                CellValue::Null
            }
        };
        row.push(*column, value);
    }
    Ok(Some(row))
}

// ---------------------------------------------------------------------------
// SubscriptionRegistry — SubscriptionManager
// ---------------------------------------------------------------------------

impl SubscriptionRegistry for AndroidBridge {
    fn active_subscriptions(&self) -> Result<Option<Vec<SubscriptionRecord>>, AccessFault> {
        with_activity(|env, activity| {
            let service = jcall(env, "new_string(service)", |env| {
                env.new_string(TELEPHONY_SUBSCRIPTION_SERVICE)
            })?;
            let manager = jcall(env, "getSystemService", |env| {
                env.call_method(
                    activity,
                    "getSystemService",
                    "(Ljava/lang/String;)Ljava/lang/Object;",
                    &[JValue::Object(&service)],
                )?
                .l()
            })?;
            if manager.is_null() {
                return Err(AccessFault::Unavailable(
                    "SubscriptionManager service not available".into(),
                ));
            }

            let list = jcall(env, "getActiveSubscriptionInfoList", |env| {
                env.call_method(
                    &manager,
                    "getActiveSubscriptionInfoList",
                    "()Ljava/util/List;",
                    &[],
                )?
                .l()
            })?;
            if list.is_null() {
                tracing::debug!("Android: no active subscription list");
                return Ok(None);
            }

            let size = jcall(env, "List.size", |env| {
                env.call_method(&list, "size", "()I", &[])?.i()
            })?;
            tracing::info!(active = size, "Android: active SIM cards");

            let mut records = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
            for i in 0..size {
                let info = jcall(env, "List.get", |env| {
                    env.call_method(&list, "get", "(I)Ljava/lang/Object;", &[JValue::Int(i)])?
                        .l()
                })?;
                records.push(subscription_record(env, &info)?);
                let _ = env.delete_local_ref(info);
            }
            Ok(Some(records))
        })
    }
}

/// Read one `android.telephony.SubscriptionInfo`.
fn subscription_record(
    env: &mut JNIEnv<'_>,
    info: &JObject<'_>,
) -> Result<SubscriptionRecord, AccessFault> {
    let slot_index = jcall(env, "getSimSlotIndex", |env| {
        env.call_method(info, "getSimSlotIndex", "()I", &[])?.i()
    })?;
    let subscription_id = jcall(env, "getSubscriptionId", |env| {
        env.call_method(info, "getSubscriptionId", "()I", &[])?.i()
    })?;

    let number = jcall(env, "getNumber", |env| {
        env.call_method(info, "getNumber", "()Ljava/lang/String;", &[])?.l()
    })?;
    let number = java_string(env, "getNumber", number)?;

    // getDisplayName() is a CharSequence; stringify it first.
    let name = jcall(env, "getDisplayName", |env| {
        env.call_method(info, "getDisplayName", "()Ljava/lang/CharSequence;", &[])?
            .l()
    })?;
    let display_name = if name.is_null() {
        None
    } else {
        let s = jcall(env, "CharSequence.toString", |env| {
            env.call_method(&name, "toString", "()Ljava/lang/String;", &[])?.l()
        })?;
        java_string(env, "CharSequence.toString", s)?
    };

    Ok(SubscriptionRecord {
        slot_index,
        subscription_id,
        number,
        display_name,
    })
}

// ---------------------------------------------------------------------------
// DeviceSettings — Settings.Secure
// ---------------------------------------------------------------------------

impl DeviceSettings for AndroidBridge {
    fn secure_string(&self, key: &str) -> Result<Option<String>, AccessFault> {
        with_activity(|env, activity| {
            let resolver = content_resolver(env, activity)?;
            let j_key = jcall(env, "new_string(key)", |env| env.new_string(key))?;
            let value = jcall(env, "Settings.Secure.getString", |env| {
                env.call_static_method(
                    "android/provider/Settings$Secure",
                    "getString",
                    "(Landroid/content/ContentResolver;Ljava/lang/String;)Ljava/lang/String;",
                    &[JValue::Object(&resolver), JValue::Object(&j_key)],
                )?
                .l()
            })?;
            java_string(env, "Settings.Secure.getString", value)
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `activity.getContentResolver()`
fn content_resolver<'l>(
    env: &mut JNIEnv<'l>,
    activity: &JObject<'_>,
) -> Result<JObject<'l>, AccessFault> {
    let resolver = jcall(env, "getContentResolver", |env| {
        env.call_method(
            activity,
            "getContentResolver",
            "()Landroid/content/ContentResolver;",
            &[],
        )?
        .l()
    })?;
    if resolver.is_null() {
        return Err(AccessFault::Unavailable("activity has no ContentResolver".into()));
    }
    Ok(resolver)
}

/// `Uri.parse(uri)`
fn parse_uri<'l>(env: &mut JNIEnv<'l>, uri: &str) -> Result<JObject<'l>, AccessFault> {
    let j_uri = jcall(env, "new_string(uri)", |env| env.new_string(uri))?;
    jcall(env, "Uri.parse", |env| {
        env.call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&j_uri)],
        )?
        .l()
    })
}

/// Build a `String[]` from Rust strings.
fn string_array<'l>(env: &mut JNIEnv<'l>, items: &[&str]) -> Result<JObjectArray<'l>, AccessFault> {
    let len = jsize::try_from(items.len())
        .map_err(|_| AccessFault::Platform("string array too large".into()))?;
    let array = jcall(env, "new_object_array", |env| {
        env.new_object_array(len, "java/lang/String", JObject::null())
    })?;
    for (i, item) in (0..len).zip(items) {
        let j_item = jcall(env, "new_string(item)", |env| env.new_string(item))?;
        jcall(env, "set_object_array_element", |env| {
            env.set_object_array_element(&array, i, &j_item)
        })?;
    }
    Ok(array)
}

/// Convert a possibly-null `java.lang.String` into a Rust string.
fn java_string(
    env: &mut JNIEnv<'_>,
    context: &str,
    obj: JObject<'_>,
) -> Result<Option<String>, AccessFault> {
    if obj.is_null() {
        return Ok(None);
    }
    let j_str = JString::from(obj);
    jcall(env, context, |env| env.get_string(&j_str).map(String::from)).map(Some)
}
