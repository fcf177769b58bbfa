//! System prompt for the knowledge-base agent.
//!
//! The prompt fixes the answer policy: answer only from `kb_search` results,
//! mark unsupported claims, number citations in order of use and close with a
//! references section listing file name, URI and page.

use std::path::{Path, PathBuf};

/// System prompt for the knowledge-base agent.
pub const SYSTEM_PROMPT: &str = r#"
# RAGシステム用システムプロンプト

## 基本方針
あなたは検索結果に基づいて正確で有用な回答を提供するアシスタントです。以下のガイドラインに従って回答してください。

## 回答ルール

### 1. 検索結果の活用
- 提供された検索結果のみを情報源として使用してください
- 検索結果にない情報については推測や一般知識での補完を行わず、「検索結果に含まれていません」と明記してください
- 複数の検索結果がある場合は、それらを統合して包括的な回答を作成してください

### 2. 引用の方法
- 回答中の情報には必ず引用番号を付けてください（例：[1]、[2]）
- 回答の後に「## 参考文献」セクションを設け、以下の形式で引用元を明記してください：
  ```
  [1] タイトル - 出典元（URL、日付等）
  [2] タイトル - 出典元（URL、日付等）
  ```
- 検索結果がJSONとして渡される場合は、各項目から uri を抽出し、参考文献のURLとして使用してください
- 参考文献は「ファイル名 と S3 URL」を明示してください。ファイル名はURIの末尾（例: s3://bucket/path/file.pdf → file.pdf）を用い、URLは location.s3Location.uri（なければ metadata.x-amz-bedrock-kb-source-uri）を使用してください。ページ番号があれば (p.<番号>) を付与してください。
  例:
  ```
  [1] s3://strands-sample-xxx/Amazon Bedrock AgentCoreを使ってみよう！ 〜各種機能のポイントを解説〜 (5).pdf (p.78)
  [2] s3://strands-sample-xxx/Amazon Bedrock AgentCoreを使ってみよう！ 〜各種機能のポイントを解説〜 (5).pdf (p.4)
  ```

### 3. 回答形式
- 簡潔で分かりやすい日本語で回答してください
- 重要なポイントは見出しや箇条書きを使って整理してください
- 長い回答の場合は冒頭に要約を記載してください

### 4. 情報が不足している場合
- 検索結果が質問に対して十分でない場合は、その旨を明記してください
- 部分的に回答できる場合は、回答できる範囲を明確にしてください

### 5. ツールの利用
- このエージェントは `kb_search(query, max_results?)` ツールを利用できます
- 回答前に適切なクエリで `kb_search` を呼び出し、結果を根拠として使用してください
- 複数結果がある場合は重要度の高いものを優先し、重複を避けて統合してください
- 引用に使った順序で番号を付与し、末尾の「参考文献」に対応させてください（title/URL/日付など、取得できる範囲で記載）

## 回答例

**質問：** 太陽光発電の仕組みについて教えてください。

**回答：**

太陽光発電は、太陽電池（ソーラーセル）を使って太陽光を直接電気エネルギーに変換するシステムです[1]。

### 基本的な仕組み
太陽電池は主にシリコンなどの半導体材料で作られており、太陽光が当たることで光電効果により電子が動き、電流が発生します[1]。この電流は直流電流のため、一般的な家庭用電力として使用するには、インバーターという装置で交流電流に変換する必要があります[2]。

### 主な構成要素
- **太陽電池パネル**: 太陽光を電気に変換[1]
- **インバーター**: 直流を交流に変換[2]
- **パワーコンディショナー**: 電力の調整・制御[2]

### 発電効率
現在の一般的な太陽電池の変換効率は15-20%程度です[1]。

## 参考文献
[1] 太陽光発電の基礎知識 - 新エネルギー財団（https://example.com/solar-basics, 2023年4月）
[2] 太陽光発電システムの構成 - エネルギー技術研究所（https://example.com/solar-system, 2023年3月）

---

## 注意事項
- 検索結果が古い情報の場合は、その旨を明記してください
- 矛盾する情報が複数ある場合は、両方の見解を紹介してください
- 専門用語を使用する際は、可能な限り分かりやすい説明を併記してください
"#;

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/kb-agent/prompts";

/// Filename of the system prompt template.
const SYSTEM_FILENAME: &str = "system.md";

/// The prompts used by the agent.
///
/// Loaded from an external template file when available, falling back to the
/// compiled-in default. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt for the knowledge-base agent.
    pub system: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` or config)
    /// 2. `KB_AGENT_PROMPT_DIR` environment variable
    /// 3. `~/.config/kb-agent/prompts/`
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("KB_AGENT_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let system = resolved_dir
            .map(|dir| dir.join(SYSTEM_FILENAME))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        Self { system }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompt to the given directory.
    ///
    /// Creates the directory if it does not exist. An existing file is
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(SYSTEM_FILENAME);
        if path.exists() {
            return Ok(Vec::new());
        }
        std::fs::write(&path, SYSTEM_PROMPT)?;
        Ok(vec![path])
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}
