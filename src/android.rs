//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jstring};
use jni::JNIEnv;

use crate::{analyze_files_json, paginate_json, Viewport};

fn to_jstring(env: &mut JNIEnv, result: crate::Result<String>) -> jstring {
    match result {
        Ok(json) => match env.new_string(&json) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(e) => {
            log::warn!("flowscore call failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Analyze staff image files and return the analysis as JSON.
///
/// Called from Kotlin as:
///   external fun analyzeFiles(pathsJson: String): String?
#[no_mangle]
pub extern "system" fn Java_com_flowscore_app_FlowScore_analyzeFiles(
    mut env: JNIEnv,
    _class: JClass,
    paths_json: JString,
) -> jstring {
    let paths: String = match env.get_string(&paths_json) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let result = analyze_files_json(&paths);
    to_jstring(&mut env, result)
}

/// Paginate a previous analysis for a viewport and zoom scale.
///
/// Called from Kotlin as:
///   external fun paginate(analysisJson: String, metricsJson: String,
///                         width: Double, height: Double, scale: Double): String?
#[no_mangle]
pub extern "system" fn Java_com_flowscore_app_FlowScore_paginate(
    mut env: JNIEnv,
    _class: JClass,
    analysis_json: JString,
    metrics_json: JString,
    width: jdouble,
    height: jdouble,
    scale: jdouble,
) -> jstring {
    let analysis: String = match env.get_string(&analysis_json) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let metrics: String = match env.get_string(&metrics_json) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let result = paginate_json(&analysis, &metrics, Viewport::new(width, height), scale);
    to_jstring(&mut env, result)
}
