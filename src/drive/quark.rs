//! Quark cloud-drive client.
//!
//! Holds one authenticated session: the session cookie (whose `__puus` field
//! the server rotates through `Set-Cookie`), the share-token cache, the
//! workspace folder and the map from shared file to transferred private copy.
//!
//! Playback of a shared file is a two-step pipeline: the file is first saved
//! ("transferred") into a private workspace folder, then a transcoded stream
//! URL is requested for the private copy.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{Mutex, OnceCell, RwLock, Semaphore};
use tracing::{debug, info, instrument, warn};

use super::credential::SessionCookie;
use super::transport::{body_error, ApiRequest, DriveEndpoint, DriveTransport};
use super::{DriveKind, MediaType, PlayerInfo};
use crate::config::DEFAULT_TRAVERSAL_CONCURRENCY;
use crate::error::{Error, Result};
use crate::proxy;

/// Request profile of the Quark PC web API.
pub const QUARK_ENDPOINT: DriveEndpoint = DriveEndpoint {
    base_url: "https://drive-pc.quark.cn/1/clouddrive/",
    user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) quark-cloud-drive/2.5.20 Chrome/100.0.4896.160 Electron/18.3.5.4-b478491100 Safari/537.36 Channel/pckk_other_ch",
    referer: "https://pan.quark.cn/",
    origin: "https://pan.quark.cn",
    fixed_query: &[("pr", "ucpro"), ("fr", "pc")],
};

/// Cookie field the server rotates.
pub const ROTATING_FIELD: &str = "__puus";

/// Files at or below this size are not offered for playback.
pub const MIN_VIDEO_SIZE: u64 = 5 * 1024 * 1024;

const RESOLUTIONS: &str = "normal,low,high,super,2k,4k";
const SORT_ORDER: &str = "file_type:asc,updated_at:desc";

/// Separator between the fields of a play id.
const PLAY_ID_SEPARATOR: &str = "++";

static SHARE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://pan\.quark\.cn/s/([^/|#?]+)").expect("valid regex"));

/// Tunables of one client.
#[derive(Debug, Clone)]
pub struct QuarkOptions {
    /// Name of the private folder transfers are saved into.
    pub workspace_dir: String,
    /// Delay before each transfer status check.
    pub poll_delay: Duration,
    /// Status checks before a transfer is given up.
    pub poll_attempts: u32,
    /// Folder listings in flight at once across a whole traversal.
    pub traversal_concurrency: usize,
    /// Entries requested per folder listing.
    pub page_size: u32,
}

impl Default for QuarkOptions {
    fn default() -> Self {
        Self {
            workspace_dir: "temptv1".to_string(),
            poll_delay: Duration::from_millis(1500),
            poll_attempts: 3,
            traversal_concurrency: DEFAULT_TRAVERSAL_CONCURRENCY,
            page_size: 200,
        }
    }
}

/// Location of a share: id, passcode and the folder to start listing from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareData {
    pub share_id: String,
    pub folder_id: String,
    pub passcode: String,
}

impl ShareData {
    /// Parse `https://pan.quark.cn/s/<id>[?pwd=<code>]`.
    #[must_use]
    pub fn from_link(link: &str) -> Option<Self> {
        let share_id = SHARE_LINK.captures(link)?.get(1)?.as_str().to_string();
        let passcode = url::Url::parse(link)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "pwd")
                    .map(|(_, v)| v.into_owned())
            })
            .unwrap_or_default();
        Some(Self {
            share_id,
            folder_id: "0".to_string(),
            passcode,
        })
    }
}

/// A playable video found in a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub fid: String,
    pub file_name: String,
    pub size: u64,
    pub share_fid_token: String,
    pub share_id: String,
    pub stoken: String,
}

impl VideoFile {
    #[must_use]
    pub fn play_id(&self) -> String {
        [
            self.fid.as_str(),
            &self.share_fid_token,
            &self.share_id,
            &self.stoken,
        ]
        .join(PLAY_ID_SEPARATOR)
    }
}

/// Parsed `fid++share_fid_token++share_id++stoken` play id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayId {
    pub fid: String,
    pub fid_token: String,
    pub share_id: String,
    pub stoken: String,
}

impl PlayId {
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split(PLAY_ID_SEPARATOR).collect();
        match parts.as_slice() {
            [fid, fid_token, share_id, stoken]
                if !fid.is_empty() && !share_id.is_empty() && !stoken.is_empty() =>
            {
                Ok(Self {
                    fid: (*fid).to_string(),
                    fid_token: (*fid_token).to_string(),
                    share_id: (*share_id).to_string(),
                    stoken: (*stoken).to_string(),
                })
            }
            _ => Err(Error::InvalidInput(format!("malformed quark play id: {id}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShareEntry {
    fid: String,
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    dir: bool,
    #[serde(default)]
    file: bool,
    #[serde(default)]
    obj_category: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    share_fid_token: String,
}

impl ShareEntry {
    fn is_playable_video(&self) -> bool {
        self.file && self.obj_category == "video" && self.size > MIN_VIDEO_SIZE
    }
}

#[derive(Debug, Deserialize)]
struct DriveEntry {
    fid: String,
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    dir: bool,
}

fn entries_at<T: serde::de::DeserializeOwned>(body: &Value, pointer: &str) -> Result<Vec<T>> {
    match body.pointer(pointer) {
        Some(list) => Ok(serde_json::from_value(list.clone())?),
        None => Ok(Vec::new()),
    }
}

fn str_at(body: &Value, pointer: &str) -> Result<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| Error::protocol(format!("response has no {pointer}")))
}

/// Authenticated Quark session.
pub struct QuarkDrive {
    transport: Arc<dyn DriveTransport>,
    options: QuarkOptions,
    cookie: RwLock<SessionCookie>,
    rotated: AtomicBool,
    share_tokens: RwLock<HashMap<String, String>>,
    /// Workspace folder id; the lock also serializes transfers.
    workspace: Mutex<Option<String>>,
    /// Source fid -> private copy fid. At most one transfer per source.
    saved_files: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    /// Private copies still referenced by `saved_files`.
    kept_copies: Mutex<HashSet<String>>,
    traversal: Semaphore,
}

impl QuarkDrive {
    pub fn new(transport: Arc<dyn DriveTransport>, cookie: &str, options: QuarkOptions) -> Result<Self> {
        if cookie.trim().is_empty() {
            return Err(Error::NotConfigured {
                drive: DriveKind::Quark.id().to_string(),
            });
        }
        let permits = options.traversal_concurrency.max(1);
        Ok(Self {
            transport,
            options,
            cookie: RwLock::new(SessionCookie::parse(cookie)),
            rotated: AtomicBool::new(false),
            share_tokens: RwLock::new(HashMap::new()),
            workspace: Mutex::new(None),
            saved_files: Mutex::new(HashMap::new()),
            kept_copies: Mutex::new(HashSet::new()),
            traversal: Semaphore::new(permits),
        })
    }

    /// Current session cookie.
    pub async fn cookie(&self) -> String {
        self.cookie.read().await.to_string()
    }

    /// The rotated cookie, if it changed since the last call.
    pub async fn take_rotated_cookie(&self) -> Option<String> {
        if self.rotated.swap(false, Ordering::SeqCst) {
            Some(self.cookie().await)
        } else {
            None
        }
    }

    async fn request(&self, request: ApiRequest) -> Result<Value> {
        let cookie = self.cookie().await;
        let response = self.transport.send(&request, &cookie).await?;
        if !response.set_cookies.is_empty()
            && self
                .cookie
                .write()
                .await
                .rotate(ROTATING_FIELD, &response.set_cookies)
        {
            self.rotated.store(true, Ordering::SeqCst);
            debug!(path = %request.path, "Session cookie rotated");
        }
        if let Some(err) = body_error(&response.body) {
            return Err(err);
        }
        Ok(response.body)
    }

    /// Share token of `share`, requested once and then cached.
    pub async fn share_token(&self, share: &ShareData) -> Result<String> {
        if let Some(stoken) = self.share_tokens.read().await.get(&share.share_id) {
            return Ok(stoken.clone());
        }

        let body = self
            .request(ApiRequest::post(
                "share/sharepage/token",
                json!({ "pwd_id": share.share_id, "passcode": share.passcode }),
            ))
            .await?;
        let stoken = str_at(&body, "/data/stoken")?;
        self.share_tokens
            .write()
            .await
            .insert(share.share_id.clone(), stoken.clone());
        debug!(share_id = %share.share_id, "Cached share token");
        Ok(stoken)
    }

    /// Forget the cached token of `share_id`.
    pub async fn invalidate_share_token(&self, share_id: &str) {
        if self.share_tokens.write().await.remove(share_id).is_some() {
            info!(share_id, "Invalidated share token");
        }
    }

    async fn share_entries(&self, share: &ShareData, stoken: &str, folder_id: &str) -> Result<Vec<ShareEntry>> {
        let _permit = self
            .traversal
            .acquire()
            .await
            .map_err(|_| Error::protocol("traversal limiter closed"))?;
        let body = self
            .request(
                ApiRequest::get("share/sharepage/detail")
                    .param("pwd_id", &share.share_id)
                    .param("stoken", stoken)
                    .param("pdir_fid", folder_id)
                    .param("_page", 1)
                    .param("_size", self.options.page_size),
            )
            .await?;
        entries_at(&body, "/data/list")
    }

    fn list_folder<'a>(
        &'a self,
        share: &'a ShareData,
        stoken: &'a str,
        folder_id: String,
    ) -> BoxFuture<'a, Result<Vec<VideoFile>>> {
        async move {
            let entries = self.share_entries(share, stoken, &folder_id).await?;

            let mut videos = Vec::new();
            let mut sub_folders = Vec::new();
            for entry in entries {
                if entry.dir {
                    sub_folders.push(entry.fid);
                } else if entry.is_playable_video() {
                    videos.push(VideoFile {
                        fid: entry.fid,
                        file_name: entry.file_name,
                        size: entry.size,
                        share_fid_token: entry.share_fid_token,
                        share_id: share.share_id.clone(),
                        stoken: stoken.to_string(),
                    });
                }
            }

            let nested = try_join_all(
                sub_folders
                    .into_iter()
                    .map(|fid| self.list_folder(share, stoken, fid)),
            )
            .await?;
            videos.extend(nested.into_iter().flatten());
            Ok(videos)
        }
        .boxed()
    }

    /// Every playable video in `share`, recursing into sub-folders.
    #[instrument(skip(self, share), fields(share_id = %share.share_id))]
    pub async fn list_videos(&self, share: &ShareData) -> Result<Vec<VideoFile>> {
        let stoken = self.share_token(share).await?;
        match self.list_folder(share, &stoken, share.folder_id.clone()).await {
            Err(Error::Api { code, message }) => {
                warn!(code, %message, "Share listing rejected, refreshing share token");
                self.invalidate_share_token(&share.share_id).await;
                let stoken = self.share_token(share).await?;
                self.list_folder(share, &stoken, share.folder_id.clone()).await
            }
            other => other,
        }
    }

    /// Play list of one share link: `name$play_id` entries joined by `#`.
    ///
    /// A share without playable videos yields an empty string.
    pub async fn play_list(&self, link: &str) -> Result<String> {
        let share = ShareData::from_link(link)
            .ok_or_else(|| Error::InvalidInput(format!("not a quark share link: {link}")))?;
        let videos = self.list_videos(&share).await?;
        info!(share_id = %share.share_id, videos = videos.len(), "Listed share");
        Ok(videos
            .iter()
            .map(|video| format!("{}${}", video.file_name, video.play_id()))
            .collect::<Vec<_>>()
            .join("#"))
    }

    async fn find_or_create_workspace(&self) -> Result<(String, bool)> {
        let body = self.request(self.listing("0")).await?;
        let entries: Vec<DriveEntry> = entries_at(&body, "/data/list")?;
        if let Some(existing) = entries
            .into_iter()
            .find(|e| e.dir && e.file_name == self.options.workspace_dir)
        {
            return Ok((existing.fid, false));
        }

        let body = self
            .request(ApiRequest::post(
                "file",
                json!({
                    "pdir_fid": "0",
                    "file_name": self.options.workspace_dir,
                    "dir_path": "",
                    "dir_init_lock": "false",
                }),
            ))
            .await?;
        let fid = str_at(&body, "/data/fid")?;
        info!(fid = %fid, name = %self.options.workspace_dir, "Created workspace folder");
        Ok((fid, true))
    }

    /// Workspace folder id, located or created on first use.
    ///
    /// Lookup failures fall back to the drive root (`"0"`) and are retried on
    /// the next call.
    async fn workspace_folder(&self, cached: &mut Option<String>, clean: bool) -> String {
        if let Some(fid) = cached.as_ref() {
            if clean {
                self.clear_workspace(fid).await;
            }
            return fid.clone();
        }

        match self.find_or_create_workspace().await {
            Ok((fid, created)) => {
                if clean && !created {
                    self.clear_workspace(&fid).await;
                }
                *cached = Some(fid.clone());
                fid
            }
            Err(e) => {
                warn!(error = %e, "Workspace lookup failed, saving to the drive root");
                "0".to_string()
            }
        }
    }

    fn listing(&self, folder_id: &str) -> ApiRequest {
        ApiRequest::get("file/sort")
            .param("pdir_fid", folder_id)
            .param("_page", 1)
            .param("_size", self.options.page_size)
            .param("_sort", SORT_ORDER)
    }

    /// Delete everything in the workspace except cached copies. Errors are logged.
    async fn clear_workspace(&self, workspace_fid: &str) {
        let result = async {
            let body = self.request(self.listing(workspace_fid)).await?;
            let entries: Vec<DriveEntry> = entries_at(&body, "/data/list")?;
            let kept = self.kept_copies.lock().await.clone();
            let stale: Vec<String> = entries
                .into_iter()
                .map(|e| e.fid)
                .filter(|fid| !kept.contains(fid))
                .collect();
            if !stale.is_empty() {
                self.delete_files(&stale).await?;
                debug!(count = stale.len(), "Cleared workspace");
            }
            Ok::<_, Error>(())
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "Failed to clear workspace");
        }
    }

    /// Delete files from the private drive.
    pub async fn delete_files(&self, fids: &[String]) -> Result<()> {
        self.request(ApiRequest::post(
            "file/delete",
            json!({ "action_type": 2, "filelist": fids, "exclude_fids": [] }),
        ))
        .await?;
        Ok(())
    }

    /// Save the shared file into the workspace and wait for the copy's id.
    #[instrument(skip(self, play), fields(fid = %play.fid))]
    async fn transfer(&self, play: &PlayId) -> Result<String> {
        let mut workspace = self.workspace.lock().await;
        let to_pdir_fid = self.workspace_folder(&mut workspace, true).await;

        let body = self
            .request(ApiRequest::post(
                "share/sharepage/save",
                json!({
                    "fid_list": [play.fid],
                    "fid_token_list": [play.fid_token],
                    "to_pdir_fid": to_pdir_fid,
                    "pwd_id": play.share_id,
                    "stoken": play.stoken,
                }),
            ))
            .await?;
        let task_id = str_at(&body, "/data/task_id")?;

        for attempt in 1..=self.options.poll_attempts.max(1) {
            tokio::time::sleep(self.options.poll_delay).await;
            let body = self
                .request(ApiRequest::get("task").param("task_id", &task_id))
                .await?;
            if let Some(copy) = body
                .pointer("/data/save_as/save_as_top_fids/0")
                .and_then(Value::as_str)
            {
                info!(copy, attempt, "Transferred file");
                self.kept_copies.lock().await.insert(copy.to_string());
                return Ok(copy.to_string());
            }
            debug!(attempt, task_id = %task_id, "Transfer not finished");
        }
        Err(Error::protocol(format!("transfer task {task_id} did not finish")))
    }

    /// Private copy of the shared file, transferring it on first use.
    ///
    /// The flag is `true` if this call performed the transfer.
    pub async fn saved_copy(&self, play: &PlayId) -> Result<(String, bool)> {
        let cell = self
            .saved_files
            .lock()
            .await
            .entry(play.fid.clone())
            .or_default()
            .clone();
        let fresh = AtomicBool::new(false);
        let transferred = &fresh;
        let copy = cell
            .get_or_try_init(move || async move {
                transferred.store(true, Ordering::SeqCst);
                self.transfer(play).await
            })
            .await?
            .clone();
        Ok((copy, fresh.load(Ordering::SeqCst)))
    }

    /// Transcoded stream URL of a private copy.
    pub async fn transcode(&self, copy_fid: &str) -> Result<String> {
        let body = self
            .request(ApiRequest::post(
                "file/v2/play",
                json!({ "fid": copy_fid, "resolutions": RESOLUTIONS }),
            ))
            .await?;
        body.pointer("/data/video_list")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|v| v.pointer("/video_info/url").and_then(Value::as_str))
            .find(|url| !url.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| Error::protocol(format!("no transcoded stream for {copy_fid}")))
    }

    /// Best-effort removal of a copy whose transcoding failed.
    async fn discard_copy(&self, source_fid: &str, copy_fid: &str) {
        match self.delete_files(&[copy_fid.to_string()]).await {
            Ok(()) => {
                self.saved_files.lock().await.remove(source_fid);
                self.kept_copies.lock().await.remove(copy_fid);
                info!(copy_fid, "Deleted untranscodable copy");
            }
            Err(e) => warn!(copy_fid, error = %e, "Failed to delete untranscodable copy"),
        }
    }

    /// Resolve a play id into a proxied stream URL.
    pub async fn player_content(&self, id: &str) -> Result<PlayerInfo> {
        let play = PlayId::parse(id)?;
        let (copy, fresh) = self.saved_copy(&play).await?;

        let stream_url = match self.transcode(&copy).await {
            Ok(url) => url,
            Err(e) => {
                if fresh {
                    self.discard_copy(&play.fid, &copy).await;
                }
                return Err(e);
            }
        };

        let cookie = self.cookie().await;
        let url = proxy::encode(DriveKind::Quark.id(), &stream_url, &cookie)
            .ok_or_else(|| Error::protocol("cannot build proxy URL"))?;
        Ok(PlayerInfo {
            url,
            media_type: MediaType::classify_transcoded(&stream_url),
            drive: Some(DriveKind::Quark),
            save_file_id: Some(copy),
        })
    }
}
